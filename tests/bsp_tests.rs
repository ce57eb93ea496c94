use proc_compiler::bsp_tree::{BspFace, BspTree, LeafContent};
use proc_compiler::compiler::{CompilerOptions, ProcCompiler};
use proc_compiler::contents::ContentFlags;
use proc_compiler::face_bsp::partition_bsp_faces;
use proc_compiler::math::{Plane, Vec3, CLIP_EPSILON};
use proc_compiler::scene::{MapBrush, MapEntity, MapScene};
use proc_compiler::winding::ProcWinding;

fn no_blocks() -> CompilerOptions {
    CompilerOptions { block_size: None, ..CompilerOptions::default() }
}

/// Square on the plane z = `z`, facing +z.
fn make_floor_face(compiler: &mut ProcCompiler, z: f64, size: f64, portal: bool) -> BspFace {
    let plane_num = compiler.proc_file_mut().planes.find_float_plane(&Plane::new(Vec3::new(0.0, 0.0, 1.0), z));
    let winding = ProcWinding::from_points(&[
        Vec3::new(0.0, 0.0, z),
        Vec3::new(0.0, size, z),
        Vec3::new(size, size, z),
        Vec3::new(size, 0.0, z),
    ]);
    BspFace::new(plane_num, portal, winding)
}

/// Square on the plane x = `x`, spanning `[0, size]` in y and z.
fn make_wall_face(compiler: &mut ProcCompiler, x: f64, size: f64, portal: bool) -> BspFace {
    let plane_num = compiler.proc_file_mut().planes.find_float_plane(&Plane::new(Vec3::new(1.0, 0.0, 0.0), x));
    let winding = ProcWinding::from_points(&[
        Vec3::new(x, 0.0, 0.0),
        Vec3::new(x, 0.0, size),
        Vec3::new(x, size, size),
        Vec3::new(x, size, 0.0),
    ]);
    BspFace::new(plane_num, portal, winding)
}

#[test]
fn face_bsp_empty_test() {
    let scene = MapScene::new();
    let mut compiler = ProcCompiler::with_options(&scene, no_blocks());
    let tree = compiler.face_bsp(Vec::new());

    assert!(tree.node(tree.head_node).is_leaf());
    assert_eq!(tree.nodes.len(), 2);
    assert_eq!(tree.leaf_nodes(), vec![tree.head_node]);
    assert_eq!(tree.leaf_content(tree.head_node), Some(LeafContent::Empty));
    assert_eq!(tree.leaf_content(tree.outside_node), Some(LeafContent::Outside));
}

#[test]
fn face_bsp_single_face_test() {
    let scene = MapScene::new();
    let mut compiler = ProcCompiler::with_options(&scene, no_blocks());
    let face = make_floor_face(&mut compiler, 0.0, 64.0, false);
    let plane_num = face.plane_num;

    let tree = compiler.face_bsp(vec![face]);

    assert_eq!(tree.num_internal_nodes(), 1);
    assert_eq!(tree.leaf_nodes().len(), 2);
    assert_eq!(tree.node(tree.head_node).plane_num(), Some(plane_num));

    let [front, back] = tree.node(tree.head_node).children().unwrap();
    assert_eq!(tree.leaf_content(front), Some(LeafContent::Empty));
    assert_eq!(tree.leaf_content(back), Some(LeafContent::Empty));
    assert_eq!(tree.node(front).parent, Some(tree.head_node));

    // The axial split plane cuts the bounds of the children.
    assert_eq!(tree.node(front).bounds.min.z, 0.0);
    assert_eq!(tree.node(back).bounds.max.z, 0.0);
}

#[test]
fn face_bsp_prefers_portal_faces_test() {
    let scene = MapScene::new();
    let mut compiler = ProcCompiler::with_options(&scene, no_blocks());
    let floor = make_floor_face(&mut compiler, -16.0, 64.0, false);
    let portal = make_wall_face(&mut compiler, 32.0, 64.0, true);
    let portal_plane_num = portal.plane_num;

    let tree = compiler.face_bsp(vec![floor, portal]);
    assert_eq!(tree.node(tree.head_node).plane_num(), Some(portal_plane_num));
}

#[test]
fn face_bsp_first_candidate_wins_ties_test() {
    let scene = MapScene::new();
    let mut compiler = ProcCompiler::with_options(&scene, no_blocks());
    let low = make_floor_face(&mut compiler, 0.0, 64.0, false);
    let high = make_floor_face(&mut compiler, 128.0, 64.0, false);
    let (low_plane_num, high_plane_num) = (low.plane_num, high.plane_num);

    let tree = compiler.face_bsp(vec![low.clone(), high.clone()]);
    assert_eq!(tree.node(tree.head_node).plane_num(), Some(low_plane_num));

    let tree = compiler.face_bsp(vec![high, low]);
    assert_eq!(tree.node(tree.head_node).plane_num(), Some(high_plane_num));
}

#[test]
fn face_bsp_block_split_test() {
    let scene = MapScene::new();
    let mut compiler = ProcCompiler::with_options(&scene, CompilerOptions { block_size: Some(1024.0), ..CompilerOptions::default() });
    let plane_num = compiler.proc_file_mut().planes.find_float_plane(&Plane::new(Vec3::new(0.0, 0.0, 1.0), 0.0));
    let face = BspFace::new(plane_num, false, ProcWinding::from_points(&[
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 64.0, 0.0),
        Vec3::new(3000.0, 64.0, 0.0),
        Vec3::new(3000.0, 0.0, 0.0),
    ]));

    let tree = compiler.face_bsp(vec![face]);

    // The block boundary comes before any face plane.
    let head_plane = compiler.proc_file().planes[tree.node(tree.head_node).plane_num().unwrap()];
    assert_eq!(head_plane.normal, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(head_plane.dist, 2048.0);

    let [front, back] = tree.node(tree.head_node).children().unwrap();
    assert_eq!(tree.node(front).bounds.min.x, 2048.0);
    assert_eq!(tree.node(back).bounds.max.x, 2048.0);

    // Both halves are then split by the face itself.
    assert_eq!(tree.node(front).plane_num(), Some(plane_num));
    assert_eq!(tree.node(back).plane_num(), Some(plane_num));
    assert_eq!(tree.num_internal_nodes(), 3);
    assert_eq!(tree.leaf_nodes().len(), 4);
}

#[test]
fn partition_bsp_faces_test() {
    let scene = MapScene::new();
    let mut compiler = ProcCompiler::with_options(&scene, no_blocks());
    let crossing = make_floor_face(&mut compiler, 0.0, 64.0, false);
    let on_plane = make_wall_face(&mut compiler, 16.0, 64.0, false);
    let in_front = make_wall_face(&mut compiler, 40.0, 64.0, false);
    let split_plane_num = on_plane.plane_num;

    let planes = &compiler.proc_file().planes;
    let partition = partition_bsp_faces(vec![crossing, on_plane, in_front], split_plane_num, planes);

    assert_eq!(partition.consumed, 1);
    assert_eq!(partition.front.len(), 2);
    assert_eq!(partition.back.len(), 1);

    let split_plane = planes[split_plane_num];
    for face in &partition.front {
        assert_ne!(face.plane_num, split_plane_num);
        for point in &face.winding.points {
            assert!(split_plane.distance(*point) >= -0.2);
        }
    }
    for face in &partition.back {
        assert_ne!(face.plane_num, split_plane_num);
        for point in &face.winding.points {
            assert!(split_plane.distance(*point) <= 0.2);
        }
    }

    // The crossing face was cut in two.
    assert!((partition.back[0].winding.area() - 16.0 * 64.0).abs() < 1e-6);
    assert!(partition.front.iter().any(|face| (face.winding.area() - 48.0 * 64.0).abs() < 1e-6));
}

#[test]
fn face_bsp_cube_test() {
    let mut world = MapEntity::new("worldspawn");
    world.add_brush(MapBrush::axial_box(Vec3::new(0.0, 0.0, 0.0), Vec3::new(64.0, 64.0, 64.0), "textures/base_wall", ContentFlags::Solid));
    let mut scene = MapScene::new();
    scene.add_entity(world);

    let mut compiler = ProcCompiler::new(&scene);
    compiler.generate_brush_data().unwrap();
    let faces = compiler.make_structural_face_list(0);
    assert_eq!(faces.len(), 6);
    assert!(faces.iter().all(|face| face.plane_num & 1 == 0));

    let tree = compiler.face_bsp(faces);

    // Every split peels one side off the cube.
    assert_eq!(tree.num_internal_nodes(), 6);
    assert_eq!(tree.leaf_nodes().len(), 7);
    assert!(!tree.leaf_nodes().contains(&tree.outside_node));

    let planes = &compiler.proc_file().planes;
    let inside = tree.point_in_leaf(Vec3::new(32.0, 32.0, 32.0), planes);
    let beside = tree.point_in_leaf(Vec3::new(100.0, 32.0, 32.0), planes);
    assert!(tree.node(inside).is_leaf());
    assert_ne!(inside, beside);
}

#[test]
fn face_list_skips_detail_and_non_portal_sides_test() {
    let mut world = MapEntity::new("worldspawn");
    world.add_brush(MapBrush::axial_box(Vec3::new(0.0, 0.0, 0.0), Vec3::new(64.0, 64.0, 64.0), "textures/base_wall", ContentFlags::Solid | ContentFlags::Detail));

    let mut portal_brush = MapBrush::axial_box(Vec3::new(-4.0, -64.0, -64.0), Vec3::new(4.0, 64.0, 64.0), "textures/common/nodraw", ContentFlags::Solid);
    portal_brush.sides[0].contents = ContentFlags::AreaPortal;
    world.add_brush(portal_brush);

    let mut scene = MapScene::new();
    scene.add_entity(world);

    let mut compiler = ProcCompiler::new(&scene);
    compiler.generate_brush_data().unwrap();
    let faces = compiler.make_structural_face_list(0);

    // Only the single areaportal side of the second brush is left.
    assert_eq!(faces.len(), 1);
    assert!(faces[0].portal);
    assert_eq!(compiler.proc_file().planes[faces[0].plane_num].normal, Vec3::new(1.0, 0.0, 0.0));
}

fn make_room_entity() -> MapEntity {
    let (min, max) = (Vec3::new(-128.0, -128.0, -128.0), Vec3::new(128.0, 128.0, 128.0));
    let outer_min = min - Vec3::new(16.0, 16.0, 16.0);
    let outer_max = max + Vec3::new(16.0, 16.0, 16.0);

    let mut world = MapEntity::new("worldspawn");
    for axis in 0..3 {
        let mut low_max = outer_max;
        low_max[axis] = min[axis];
        let mut high_min = outer_min;
        high_min[axis] = max[axis];
        world.add_brush(MapBrush::axial_box(outer_min, low_max, "textures/base_wall", ContentFlags::Solid));
        world.add_brush(MapBrush::axial_box(high_min, outer_max, "textures/base_wall", ContentFlags::Solid));
    }
    // A pillar that is cut by the wall planes.
    world.add_brush(MapBrush::axial_box(Vec3::new(-32.0, -32.0, -128.0), Vec3::new(32.0, 32.0, 128.0), "textures/base_wall", ContentFlags::Solid));
    world
}

/// Re-partition the faces down the built tree, checking that each child only
/// receives faces on its side and that no split plane is used twice on a path.
fn check_node(compiler: &ProcCompiler, tree: &BspTree, node: usize, faces: Vec<BspFace>, path: &mut Vec<usize>) {
    let planes = &compiler.proc_file().planes;
    let (plane_num, [front, back]) = match tree.node(node).plane_num().zip(tree.node(node).children()) {
        Some(split) => split,
        None => {
            assert!(faces.is_empty(), "leaf {} still has {} faces", node, faces.len());
            return;
        }
    };

    assert!(!path.contains(&(plane_num & !1)), "plane {} reused below itself", plane_num);

    let partition = partition_bsp_faces(faces, plane_num, planes);
    let plane = planes[plane_num];
    for face in &partition.front {
        assert!(face.winding.points.iter().all(|point| plane.distance(*point) >= -CLIP_EPSILON * 2.0));
    }
    for face in &partition.back {
        assert!(face.winding.points.iter().all(|point| plane.distance(*point) <= CLIP_EPSILON * 2.0));
    }

    path.push(plane_num & !1);
    check_node(compiler, tree, front, partition.front, path);
    check_node(compiler, tree, back, partition.back, path);
    path.pop();
}

#[test]
fn face_bsp_splits_are_consistent_test() {
    let mut scene = MapScene::new();
    scene.add_entity(make_room_entity());

    let mut compiler = ProcCompiler::with_options(&scene, no_blocks());
    compiler.generate_brush_data().unwrap();
    let faces = compiler.make_structural_face_list(0);
    assert_eq!(faces.len(), 42);

    let tree = compiler.face_bsp(faces.clone());
    assert!(tree.num_internal_nodes() > 6);

    check_node(&compiler, &tree, tree.head_node, faces, &mut Vec::new());
}

use proc_compiler::brush::ProcBrush;
use proc_compiler::contents::ContentFlags;
use proc_compiler::error::BrushError;
use proc_compiler::math::{Plane, PlaneSide, Vec3};
use proc_compiler::plane_set::PlaneSet;
use proc_compiler::scene::{MapBrush, MapBrushSide};

fn make_cube(min: f64, max: f64, contents: ContentFlags) -> MapBrush {
    MapBrush::axial_box(Vec3::new(min, min, min), Vec3::new(max, max, max), "textures/base_wall", contents)
}

fn build(map_brush: &MapBrush, planes: &mut PlaneSet) -> ProcBrush {
    ProcBrush::from_map_brush(map_brush, 0, 0, Vec3::new(0.0, 0.0, 0.0), planes).unwrap()
}

#[test]
fn brush_from_cube_test() {
    let mut planes = PlaneSet::new();
    let brush = build(&make_cube(0.0, 64.0, ContentFlags::Solid), &mut planes);

    // Six distinct planes, each stored with its flip.
    assert_eq!(brush.sides.len(), 6);
    assert_eq!(planes.len(), 12);
    assert!(brush.sides.iter().all(|side| side.plane_num % 2 == 0));
    for side in &brush.sides {
        let winding = side.winding.as_ref().unwrap();
        assert_eq!(winding.len(), 4);
        assert!((winding.area() - 4096.0).abs() < 1e-6);
        assert_eq!(side.material, "textures/base_wall");
    }
    assert_eq!(brush.bounds.min, Vec3::new(0.0, 0.0, 0.0));
    assert_eq!(brush.bounds.max, Vec3::new(64.0, 64.0, 64.0));
    assert!((brush.volume(&planes) - 262144.0).abs() < 1e-3);
    assert!(brush.opaque);
    assert!(brush.structural);
}

#[test]
fn brush_side_windings_face_outward_test() {
    let mut planes = PlaneSet::new();
    let brush = build(&make_cube(0.0, 64.0, ContentFlags::Solid), &mut planes);

    for side in &brush.sides {
        let winding_plane = side.winding.as_ref().unwrap().plane().unwrap();
        let plane = planes[side.plane_num];
        assert!((winding_plane.normal.x - plane.normal.x).abs() < 1e-9);
        assert!((winding_plane.normal.y - plane.normal.y).abs() < 1e-9);
        assert!((winding_plane.normal.z - plane.normal.z).abs() < 1e-9);
    }
}

#[test]
fn brush_origin_offset_test() {
    let mut planes = PlaneSet::new();
    let map_brush = make_cube(96.0, 160.0, ContentFlags::Solid);
    let brush = ProcBrush::from_map_brush(&map_brush, 1, 0, Vec3::new(128.0, 128.0, 128.0), &mut planes).unwrap();
    assert_eq!(brush.bounds.min, Vec3::new(-32.0, -32.0, -32.0));
    assert_eq!(brush.bounds.max, Vec3::new(32.0, 32.0, 32.0));
    assert_eq!(brush.entity_num, 1);
}

#[test]
fn brush_duplicate_plane_test() {
    let mut planes = PlaneSet::new();
    let mut map_brush = make_cube(0.0, 64.0, ContentFlags::Solid);
    let duplicate = map_brush.sides[0].clone();
    map_brush.sides.push(duplicate);

    let brush = build(&map_brush, &mut planes);
    assert_eq!(brush.sides.len(), 6);
}

#[test]
fn brush_mirrored_plane_test() {
    let mut planes = PlaneSet::new();
    let map_brush = MapBrush::new(vec![
        MapBrushSide::new(Plane::new(Vec3::new(1.0, 0.0, 0.0), 8.0), "a", ContentFlags::Solid),
        MapBrushSide::new(Plane::new(Vec3::new(-1.0, 0.0, 0.0), -8.0), "a", ContentFlags::Solid),
    ]);
    let result = ProcBrush::from_map_brush(&map_brush, 0, 0, Vec3::new(0.0, 0.0, 0.0), &mut planes);
    assert_eq!(result, Err(BrushError::MirroredPlane { side: 1 }));
}

#[test]
fn brush_invalid_plane_test() {
    let mut planes = PlaneSet::new();
    let mut map_brush = make_cube(0.0, 64.0, ContentFlags::Solid);
    map_brush.sides[2].plane = Plane::new(Vec3::new(0.0, 0.0, 0.0), 1.0);
    let result = ProcBrush::from_map_brush(&map_brush, 0, 0, Vec3::new(0.0, 0.0, 0.0), &mut planes);
    assert_eq!(result, Err(BrushError::InvalidPlane { side: 2 }));
}

#[test]
fn brush_too_few_sides_test() {
    let mut planes = PlaneSet::new();
    let map_brush = MapBrush::new(vec![
        MapBrushSide::new(Plane::new(Vec3::new(1.0, 0.0, 0.0), 8.0), "a", ContentFlags::Solid),
        MapBrushSide::new(Plane::new(Vec3::new(0.0, 1.0, 0.0), 8.0), "a", ContentFlags::Solid),
        MapBrushSide::new(Plane::new(Vec3::new(0.0, 0.0, 1.0), 8.0), "a", ContentFlags::Solid),
    ]);
    let result = ProcBrush::from_map_brush(&map_brush, 0, 0, Vec3::new(0.0, 0.0, 0.0), &mut planes);
    assert_eq!(result, Err(BrushError::TooFewSides { count: 3 }));
}

#[test]
fn brush_contents_test() {
    let mut planes = PlaneSet::new();

    let detail = build(&make_cube(0.0, 64.0, ContentFlags::Solid | ContentFlags::Detail), &mut planes);
    assert!(detail.opaque);
    assert!(!detail.structural);

    let water = build(&make_cube(0.0, 64.0, ContentFlags::Water), &mut planes);
    assert!(!water.opaque);
    assert!(!water.structural);

    let portal = build(&make_cube(0.0, 64.0, ContentFlags::AreaPortal), &mut planes);
    assert!(!portal.opaque);
    assert!(portal.structural);
}

#[test]
fn brush_portal_side_test() {
    let mut planes = PlaneSet::new();
    let map_brush = MapBrush::axial_box(Vec3::new(-4.0, -128.0, -128.0), Vec3::new(4.0, 128.0, 128.0), "textures/editor/visportal", ContentFlags::AreaPortal);
    let brush = build(&map_brush, &mut planes);

    // The two big faces tie, the first one wins.
    assert_eq!(brush.portal_side(), Some(0));
    assert_eq!(planes[brush.sides[0].plane_num].normal, Vec3::new(1.0, 0.0, 0.0));

    let solid = build(&make_cube(0.0, 64.0, ContentFlags::Solid), &mut planes);
    assert_eq!(solid.portal_side(), None);
}

#[test]
fn brush_split_test() {
    let mut planes = PlaneSet::new();
    let brush = build(&make_cube(0.0, 64.0, ContentFlags::Solid), &mut planes);
    let plane_num = planes.find_float_plane(&Plane::new(Vec3::new(1.0, 0.0, 0.0), 16.0));

    let (front, back) = brush.split(plane_num, &planes);
    let front = front.unwrap();
    let back = back.unwrap();

    assert_eq!(front.sides.len(), 6);
    assert_eq!(back.sides.len(), 6);
    assert!((front.volume(&planes) - 64.0 * 64.0 * 48.0).abs() < 1e-3);
    assert!((back.volume(&planes) - 64.0 * 64.0 * 16.0).abs() < 1e-3);
    assert!((front.volume(&planes) + back.volume(&planes) - brush.volume(&planes)).abs() < 1e-3);
    assert_eq!(front.bounds.min.x, 16.0);
    assert_eq!(back.bounds.max.x, 16.0);

    // The new sides close the halves with the split plane pair.
    assert!(front.sides.iter().any(|side| side.plane_num == plane_num ^ 1));
    assert!(back.sides.iter().any(|side| side.plane_num == plane_num));

    // The original is untouched.
    assert_eq!(brush.sides.len(), 6);
    assert!((brush.volume(&planes) - 262144.0).abs() < 1e-3);
}

#[test]
fn brush_split_not_intersecting_test() {
    let mut planes = PlaneSet::new();
    let brush = build(&make_cube(0.0, 64.0, ContentFlags::Solid), &mut planes);

    let beyond = planes.find_float_plane(&Plane::new(Vec3::new(1.0, 0.0, 0.0), 100.0));
    let (front, back) = brush.split(beyond, &planes);
    assert!(front.is_none());
    assert!((back.unwrap().volume(&planes) - brush.volume(&planes)).abs() < 1e-6);

    let before = planes.find_float_plane(&Plane::new(Vec3::new(1.0, 0.0, 0.0), -100.0));
    let (front, back) = brush.split(before, &planes);
    assert!(back.is_none());
    assert!((front.unwrap().volume(&planes) - brush.volume(&planes)).abs() < 1e-6);

    // A plane touching a face doesn't split either.
    let touching = planes.find_float_plane(&Plane::new(Vec3::new(0.0, 0.0, 1.0), 64.0));
    let (front, back) = brush.split(touching, &planes);
    assert!(front.is_none());
    assert!(back.is_some());
}

#[test]
fn brush_split_slack_test() {
    let mut planes = PlaneSet::new();
    let brush = build(&make_cube(0.0, 64.0, ContentFlags::Solid), &mut planes);

    // Reaching less than 0.1 past the plane counts as not reaching it.
    let plane_num = planes.find_float_plane(&Plane::new(Vec3::new(0.0, 1.0, 0.0), 63.95));
    let (front, back) = brush.split(plane_num, &planes);
    assert!(front.is_none());
    assert_eq!(back.unwrap().sides.len(), 6);
}

#[test]
fn brush_split_min_volume_test() {
    let mut planes = PlaneSet::new();
    let brush = build(&make_cube(0.0, 2.0, ContentFlags::Solid), &mut planes);

    // The front half would be under the minimum volume.
    let plane_num = planes.find_float_plane(&Plane::new(Vec3::new(0.0, 1.0, 0.0), 1.85));
    let (front, back) = brush.split(plane_num, &planes);
    assert!(front.is_none());
    assert!((back.unwrap().volume(&planes) - 2.0 * 2.0 * 1.85).abs() < 1e-6);
}

#[test]
fn brush_mostly_on_side_test() {
    let mut planes = PlaneSet::new();
    let brush = build(&make_cube(0.0, 64.0, ContentFlags::Solid), &mut planes);
    assert_eq!(brush.mostly_on_side(&Plane::new(Vec3::new(1.0, 0.0, 0.0), 10.0)), PlaneSide::Front);
    assert_eq!(brush.mostly_on_side(&Plane::new(Vec3::new(1.0, 0.0, 0.0), 50.0)), PlaneSide::Back);
}

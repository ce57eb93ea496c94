use log::{debug, info, warn};

use crate::bsp_tree::{BspFace, BspNodeKind, BspTree};
use crate::compiler::ProcCompiler;
use crate::contents::ContentFlags;
use crate::math::{Plane, PlaneSide, Vec3, CLIP_EPSILON, ON_EPSILON};
use crate::plane_set::PlaneSet;
use crate::winding::WindingSplit;

/// Deeper trees mean the face list isn't shrinking.
pub const MAX_TREE_DEPTH: usize = 2048;

/// Block splits are skipped when either side would be thinner than this.
const BLOCK_SPLIT_MARGIN: f64 = 32.0;

/// The faces left on each side of a split.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacePartition {
    pub front: Vec<BspFace>,
    pub back: Vec<BspFace>,
    /// Faces lying on the split plane.
    pub consumed: usize,
}

/// Distribute faces to the sides of `plane_num`. Faces on the plane are
/// consumed, faces crossing it are split into two new faces.
pub fn partition_bsp_faces(faces: Vec<BspFace>, plane_num: usize, planes: &PlaneSet) -> FacePartition {
    let plane = &planes[plane_num];
    let mut partition = FacePartition::default();

    for face in faces {
        if face.plane_num == plane_num {
            partition.consumed += 1;
            continue;
        }

        match face.winding.plane_side(plane, ON_EPSILON) {
            PlaneSide::Front => partition.front.push(face),
            PlaneSide::Back => partition.back.push(face),
            PlaneSide::On => partition.consumed += 1,
            PlaneSide::Cross => match face.winding.split(plane, CLIP_EPSILON * 2.0) {
                WindingSplit::Front => partition.front.push(face),
                WindingSplit::Back => partition.back.push(face),
                WindingSplit::Split(front, back) => {
                    partition.front.push(BspFace::new(face.plane_num, face.portal, front));
                    partition.back.push(BspFace::new(face.plane_num, face.portal, back));
                }
            },
        }
    }

    partition
}

impl<'a> ProcCompiler<'a> {
    /// Collect a face for every side of every structural brush of the entity.
    pub fn make_structural_face_list(&self, entity_num: usize) -> Vec<BspFace> {
        let entity = &self.proc_file.entities[entity_num];
        let mut faces = Vec::new();

        for brush in entity.brushes.iter().filter(|brush| brush.structural) {
            let area_portal = brush.contents.contains(ContentFlags::AreaPortal);

            for side in &brush.sides {
                let winding = match &side.winding {
                    Some(winding) => winding,
                    None => continue,
                };

                // Only the portal sides of an areaportal brush split the world.
                let portal = side.contents.contains(ContentFlags::AreaPortal);
                if area_portal && !portal {
                    continue;
                }

                if winding.is_tiny() || winding.area() < self.options.min_face_area {
                    warn!("Entity {}, Brush {}: dropping degenerate face", entity_num, brush.brush_num);
                    continue;
                }

                faces.push(BspFace::new(side.plane_num & !1, portal, winding.clone()));
            }
        }

        debug!("Entity {}: {} structural faces", entity_num, faces.len());
        faces
    }

    /// Build the tree of a model from its face list.
    pub fn face_bsp(&mut self, faces: Vec<BspFace>) -> BspTree {
        let mut tree = BspTree::new();

        for face in &faces {
            tree.bounds.add_points(&face.winding.points);
        }
        let head_node = tree.head_node;
        tree.nodes[head_node].bounds = tree.bounds;

        self.build_face_tree_recursively(head_node, faces, &mut tree, 0);

        info!("{} leaves, {} nodes", tree.leaf_nodes().len(), tree.num_internal_nodes());
        tree
    }

    /// Choose the plane to split `node` with, or `None` to make it a leaf.
    pub fn select_split_plane_num(&mut self, node: usize, faces: &mut [BspFace], tree: &BspTree) -> Option<usize> {
        if faces.is_empty() {
            return None;
        }

        // Force split along block boundaries.
        if let Some(block_size) = self.options.block_size.filter(|size| *size > 0.0) {
            let bounds = tree.nodes[node].bounds;
            if bounds.is_valid {
                let mid = bounds.center();
                for axis in 0..3 {
                    let dist = block_size * ((mid[axis] / block_size).floor() + 1.0);
                    if bounds.max[axis] - dist > BLOCK_SPLIT_MARGIN && dist - bounds.min[axis] > BLOCK_SPLIT_MARGIN {
                        let mut normal = Vec3::new(0.0, 0.0, 0.0);
                        normal[axis] = 1.0;
                        return Some(self.proc_file.planes.find_float_plane(&Plane::new(normal, dist)));
                    }
                }
            }
        }

        // Pick one of the face planes. If we have any portal faces, only
        // those are candidates.
        let have_portals = faces.iter().any(|face| face.portal);
        let weights = self.options.split_weights;
        let planes = &self.proc_file.planes;

        for face in faces.iter_mut() {
            face.checked = false;
        }

        let mut best: Option<(usize, i64)> = None;

        for i in 0..faces.len() {
            if faces[i].checked || faces[i].portal != have_portals {
                continue;
            }

            let plane_num = faces[i].plane_num;
            let plane = &planes[plane_num];
            let mut facing = 0i64;
            let mut splits = 0i64;
            let mut front = 0i64;
            let mut back = 0i64;

            for check in faces.iter_mut() {
                if check.plane_num == plane_num {
                    facing += 1;
                    check.checked = true;
                    continue;
                }
                match check.winding.plane_side(plane, ON_EPSILON) {
                    PlaneSide::Cross => splits += 1,
                    PlaneSide::Front => front += 1,
                    PlaneSide::Back => back += 1,
                    PlaneSide::On => {}
                }
            }

            let mut score = facing * weights.facing - splits * weights.split - (front - back).abs() * weights.balance;
            if plane.plane_type().is_axial() {
                score += weights.axial_bonus;
            }

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((plane_num, score));
            }
        }

        best.map(|(plane_num, _)| plane_num)
    }

    /// Turn `node` into a leaf or split it, handing each child its share of
    /// the faces.
    pub fn build_face_tree_recursively(&mut self, node: usize, mut faces: Vec<BspFace>, tree: &mut BspTree, depth: usize) {
        assert!(depth < MAX_TREE_DEPTH, "tree depth exceeded {}", MAX_TREE_DEPTH);

        let plane_num = match self.select_split_plane_num(node, &mut faces, tree) {
            Some(plane_num) => plane_num,
            None => {
                // A leaf node.
                tree.nodes[node].kind = BspNodeKind::Leaf(Default::default());
                return;
            }
        };

        let partition = partition_bsp_faces(faces, plane_num, &self.proc_file.planes);

        let bounds = tree.nodes[node].bounds;
        let front = tree.alloc_node(Some(node), bounds);
        let back = tree.alloc_node(Some(node), bounds);

        // Split the bounds if we have a nice axial plane.
        let plane = self.proc_file.planes[plane_num];
        if let Some(axis) = plane.plane_type().axis() {
            if plane.normal[axis] > 0.0 {
                tree.nodes[front].bounds.min[axis] = plane.dist;
                tree.nodes[back].bounds.max[axis] = plane.dist;
            } else {
                tree.nodes[front].bounds.max[axis] = -plane.dist;
                tree.nodes[back].bounds.min[axis] = -plane.dist;
            }
        }

        tree.nodes[node].kind = BspNodeKind::Internal { plane_num, children: [front, back] };

        self.build_face_tree_recursively(front, partition.front, tree, depth + 1);
        self.build_face_tree_recursively(back, partition.back, tree, depth + 1);
    }
}

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::bsp_tree::{BspNodeKind, BspTree};
use crate::compiler::ProcCompiler;
use crate::contents::ContentFlags;
use crate::math::{Vec3, CLIP_EPSILON};
use crate::proc_file::{InterAreaPortal, ProcArea, ProcTri};
use crate::winding::{ProcWinding, WindingSplit};

/// Outcome of placing the entities of a map into its world tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloodResult {
    /// At least one entity is inside and the outside was never reached.
    Sealed,
    /// No entity origin landed in open space, nothing can be filled.
    NoOccupants,
    /// The outside node is reachable from an entity.
    Leaked,
}

impl<'a> ProcCompiler<'a> {
    /// Flood occupancy from the leaf holding `origin`. Returns false if the
    /// origin is inside an opaque leaf.
    pub fn place_occupant(&self, tree: &mut BspTree, origin: Vec3, occupant: usize) -> bool {
        let node = tree.point_in_leaf(origin, &self.proc_file.planes);
        match tree.leaf_mut(node) {
            Some(leaf) if !leaf.opaque => leaf.occupant = Some(occupant),
            _ => return false,
        }

        flood_portals(tree, node);
        true
    }

    /// Place every entity with an origin into the tree of `entity_num`.
    pub fn flood_entities(&self, entity_num: usize, tree: &mut BspTree) -> FloodResult {
        let mut inside = false;
        for (occupant, origin) in self.occupant_origins(entity_num) {
            if self.place_occupant(tree, origin, occupant) {
                inside = true;
            } else {
                debug!("Entity {} is in solid", occupant);
            }
        }

        let outside_occupied = tree.leaf(tree.outside_node).map_or(false, |leaf| leaf.occupied.is_some());

        if !inside {
            warn!("No entities in open, no filling");
            FloodResult::NoOccupants
        } else if outside_occupied {
            warn!("Entity reached from outside, leak detected");
            FloodResult::Leaked
        } else {
            FloodResult::Sealed
        }
    }

    /// Portal centres leading from the outside node back toward the occupant
    /// that reached it.
    pub fn leak_trail(&self, tree: &BspTree) -> Vec<Vec3> {
        let mut trail = Vec::new();
        let mut node = tree.outside_node;
        let mut dist = match tree.leaf(node).and_then(|leaf| leaf.occupied) {
            Some(dist) => dist,
            None => return trail,
        };

        while dist > 1 {
            // Find the closest neighbour.
            let mut best: Option<(usize, usize, usize)> = None;
            for &id in &tree.nodes[node].portals {
                let other = match tree.portal(id).other_node(node) {
                    Some(other) => other,
                    None => continue,
                };
                if let Some(other_dist) = tree.leaf(other).and_then(|leaf| leaf.occupied) {
                    if other_dist < dist && best.map_or(true, |(_, _, best_dist)| other_dist < best_dist) {
                        best = Some((id, other, other_dist));
                    }
                }
            }

            match best {
                Some((id, other, other_dist)) => {
                    trail.push(tree.portal(id).winding.center());
                    node = other;
                    dist = other_dist;
                }
                None => break,
            }
        }

        trail
    }

    /// Classify every unoccupied leaf: `outside` if the outside node reaches
    /// it, opaque otherwise. Returns both counts.
    pub fn fill_outside(&self, tree: &mut BspTree) -> (usize, usize) {
        let mut num_outside = 0;
        let mut stack = vec![tree.outside_node];

        while let Some(node) = stack.pop() {
            let portals = tree.nodes[node].portals.clone();
            for id in portals {
                let other = match tree.portal(id).other_node(node) {
                    Some(other) => other,
                    None => continue,
                };
                if let Some(leaf) = tree.leaf_mut(other) {
                    if leaf.opaque || leaf.outside || leaf.occupied.is_some() {
                        continue;
                    }
                    leaf.outside = true;
                    num_outside += 1;
                    stack.push(other);
                }
            }
        }

        let mut num_sealed = 0;
        for node in tree.leaf_nodes() {
            if let Some(leaf) = tree.leaf_mut(node) {
                if !leaf.opaque && !leaf.outside && leaf.occupied.is_none() {
                    leaf.opaque = true;
                    num_sealed += 1;
                }
            }
        }

        info!("{} outside leaves, {} sealed leaves", num_outside, num_sealed);
        (num_outside, num_sealed)
    }

    /// True if the portal connects two open leaves.
    pub fn portal_passable(&self, tree: &BspTree, id: usize) -> bool {
        let portal = tree.portal(id);
        if portal.on_node.is_none() {
            // To the outside node.
            return false;
        }
        portal.nodes.iter().all(|node| match node.and_then(|node| tree.leaf(node)) {
            Some(leaf) => !leaf.opaque && !leaf.outside,
            None => false,
        })
    }

    /// The areaportal brush side a portal lies on, as `(brush_num, side_num)`.
    pub fn find_side_for_portal(&self, entity_num: usize, tree: &BspTree, id: usize) -> Option<(usize, usize)> {
        let portal = tree.portal(id);
        let plane_num = tree.nodes[portal.on_node?].plane_num()?;
        let center = portal.winding.center();
        let brushes = &self.proc_file.entities[entity_num].brushes;

        // Scan both bordering nodes for an areaportal brush sharing the plane.
        for node in portal.nodes.iter().flatten() {
            let leaf = match tree.leaf(*node) {
                Some(leaf) => leaf,
                None => continue,
            };
            for fragment in &leaf.brushes {
                if !fragment.contents.contains(ContentFlags::AreaPortal) {
                    continue;
                }
                let original = match brushes.get(fragment.brush_num) {
                    Some(original) => original,
                    None => continue,
                };
                let side_num = match original.portal_side() {
                    Some(side_num) => side_num,
                    None => continue,
                };
                let side = &original.sides[side_num];
                if side.plane_num & !1 != plane_num & !1 {
                    continue;
                }
                if let Some(winding) = &side.winding {
                    if !winding.bounds().contains_point(&center, CLIP_EPSILON) {
                        continue;
                    }
                }
                return Some((fragment.brush_num, side_num));
            }
        }

        None
    }

    /// Number the connected groups of open leaves. Returns the area count.
    pub fn flood_areas(&self, entity_num: usize, tree: &mut BspTree) -> usize {
        let mut num_areas = 0;

        for start in tree.leaf_nodes() {
            match tree.leaf_mut(start) {
                Some(leaf) if !leaf.opaque && !leaf.outside && leaf.area.is_none() => leaf.area = Some(num_areas),
                _ => continue,
            }

            let mut stack = vec![start];
            while let Some(node) = stack.pop() {
                let portals = tree.nodes[node].portals.clone();
                for id in portals {
                    if !self.portal_passable(tree, id) {
                        continue;
                    }
                    // Areaportal sides separate areas.
                    if self.find_side_for_portal(entity_num, tree, id).is_some() {
                        continue;
                    }
                    let other = match tree.portal(id).other_node(node) {
                        Some(other) => other,
                        None => continue,
                    };
                    if let Some(leaf) = tree.leaf_mut(other) {
                        if leaf.area.is_none() {
                            leaf.area = Some(num_areas);
                            stack.push(other);
                        }
                    }
                }
            }

            num_areas += 1;
        }

        info!("{} areas", num_areas);
        num_areas
    }

    /// One record per areaportal side that separates two different areas.
    pub fn find_inter_area_portals(&self, entity_num: usize, tree: &BspTree) -> Vec<InterAreaPortal> {
        let brushes = &self.proc_file.entities[entity_num].brushes;
        let mut inter_area_portals: Vec<InterAreaPortal> = Vec::new();

        for node in tree.leaf_nodes() {
            let area = match tree.leaf(node).and_then(|leaf| leaf.area) {
                Some(area) => area,
                None => continue,
            };
            for &id in &tree.nodes[node].portals {
                let other_area = match tree.portal(id).other_node(node).and_then(|other| tree.leaf(other)).and_then(|leaf| leaf.area) {
                    Some(other_area) => other_area,
                    None => continue,
                };
                // Only report from the lower area so each portal is seen once.
                if other_area <= area {
                    continue;
                }
                let (brush_num, side_num) = match self.find_side_for_portal(entity_num, tree, id) {
                    Some(side) => side,
                    None => continue,
                };
                if inter_area_portals.iter().any(|iap| iap.brush_num == brush_num && iap.side_num == side_num) {
                    continue;
                }
                let winding = brushes[brush_num].sides[side_num].winding.clone().unwrap_or_default();
                inter_area_portals.push(InterAreaPortal {
                    areas: [area, other_area],
                    brush_num,
                    side_num,
                    winding,
                });
            }
        }

        debug!("{} inter area portals", inter_area_portals.len());
        inter_area_portals
    }

    /// Sort the visible geometry of the entity into its areas. Returns the
    /// areas and the number of patch triangles that ended up in no area.
    pub fn put_primitives_in_areas(&self, entity_num: usize, tree: &BspTree, num_areas: usize) -> (Vec<ProcArea>, usize) {
        let entity = &self.proc_file.entities[entity_num];
        let planes = &self.proc_file.planes;
        let mut areas = vec![ProcArea::default(); num_areas];
        let mut num_dropped = 0;

        // Brush sides are clipped into the tree, fragments in solid are hidden.
        for brush in &entity.brushes {
            for side in &brush.sides {
                if side.material.is_empty() || side.contents.contains(ContentFlags::AreaPortal) {
                    continue;
                }
                if let Some(winding) = &side.winding {
                    self.clip_side_into_tree(tree, tree.head_node, winding.clone(), &side.material, &mut areas);
                }
            }
        }

        for triangle in &entity.patch_triangles {
            let node = tree.point_in_leaf(triangle.centroid(), planes);
            match tree.leaf(node).and_then(|leaf| leaf.area) {
                Some(area) if area < areas.len() => areas[area].triangles.push(triangle.clone()),
                _ => num_dropped += 1,
            }
        }

        if num_dropped > 0 {
            warn!("Entity {}: {} patch triangles outside of any area", entity_num, num_dropped);
        }

        (areas, num_dropped)
    }

    fn clip_side_into_tree(&self, tree: &BspTree, node: usize, winding: ProcWinding, material: &str, areas: &mut [ProcArea]) {
        match &tree.nodes[node].kind {
            BspNodeKind::Leaf(leaf) => {
                let area = match leaf.area {
                    Some(area) if area < areas.len() => area,
                    _ => return,
                };
                for i in 1..winding.len().saturating_sub(1) {
                    areas[area].triangles.push(ProcTri {
                        material: material.to_string(),
                        vertices: [winding.points[0], winding.points[i], winding.points[i + 1]],
                    });
                }
            }
            BspNodeKind::Internal { plane_num, children } => {
                match winding.split(&self.proc_file.planes[*plane_num], CLIP_EPSILON) {
                    WindingSplit::Front => self.clip_side_into_tree(tree, children[0], winding, material, areas),
                    WindingSplit::Back => self.clip_side_into_tree(tree, children[1], winding, material, areas),
                    WindingSplit::Split(front, back) => {
                        self.clip_side_into_tree(tree, children[0], front, material, areas);
                        self.clip_side_into_tree(tree, children[1], back, material, areas);
                    }
                }
            }
        }
    }
}

/// Breadth first occupancy flood. Distances grow by one per portal crossed;
/// opaque leaves stop the flood, the outside node does not.
fn flood_portals(tree: &mut BspTree, start: usize) {
    let mut queue = VecDeque::new();
    queue.push_back((start, 1));

    while let Some((node, dist)) = queue.pop_front() {
        match tree.leaf_mut(node) {
            Some(leaf) if !leaf.opaque && leaf.occupied.is_none() => leaf.occupied = Some(dist),
            _ => continue,
        }
        for &id in &tree.nodes[node].portals {
            if let Some(other) = tree.portal(id).other_node(node) {
                queue.push_back((other, dist + 1));
            }
        }
    }
}

use log::{debug, info, warn};

use crate::bounds::Bounds;
use crate::bsp_tree::{BspNodeKind, BspTree, ProcPortal};
use crate::compiler::ProcCompiler;
use crate::math::{Plane, Vec3, BASE_WINDING_EPSILON, CLIP_EPSILON, MAX_WORLD_COORD, MIN_WORLD_COORD, ON_EPSILON, SPLIT_WINDING_EPSILON};
use crate::winding::{ProcWinding, WindingSplit};

/// Space left between the tree bounds and the head node portals.
pub const SIDESPACE: f64 = 8.0;

impl<'a> ProcCompiler<'a> {
    /// Number of portals currently allocated for the model being compiled.
    pub fn num_active_portals(&self) -> usize {
        self.num_active_portals
    }

    pub fn num_peak_portals(&self) -> usize {
        self.num_peak_portals
    }

    pub fn num_tiny_portals(&self) -> usize {
        self.num_tiny_portals
    }

    fn alloc_portal(&mut self, tree: &mut BspTree, portal: ProcPortal) -> usize {
        self.num_active_portals += 1;
        self.num_peak_portals = self.num_peak_portals.max(self.num_active_portals);
        tree.alloc_portal(portal)
    }

    fn free_portal(&mut self, tree: &mut BspTree, id: usize) {
        self.num_active_portals = self.num_active_portals.saturating_sub(1);
        tree.free_portal(id);
    }

    /// Create the six portals around the head node, each linking it to the
    /// outside node. Their planes face inward.
    pub fn make_head_node_portals(&mut self, tree: &mut BspTree) {
        let head_node = tree.head_node;
        let outside_node = tree.outside_node;

        // If no nodes, don't go any further.
        if tree.nodes[head_node].is_leaf() {
            return;
        }

        let bounds = tree.bounds.expand_by(SIDESPACE);
        let mut planes = Vec::with_capacity(6);
        for side in 0..2 {
            for axis in 0..3 {
                let mut normal = Vec3::new(0.0, 0.0, 0.0);
                if side == 0 {
                    normal[axis] = 1.0;
                    planes.push(Plane::new(normal, bounds.min[axis]));
                } else {
                    normal[axis] = -1.0;
                    planes.push(Plane::new(normal, -bounds.max[axis]));
                }
            }
        }

        // Clip the base windings by all the other planes.
        for (i, plane) in planes.iter().enumerate() {
            let mut winding = Some(ProcWinding::from_plane(plane));
            for (j, other) in planes.iter().enumerate() {
                if i == j {
                    continue;
                }
                winding = match winding {
                    Some(w) => w.clip(other, ON_EPSILON, false),
                    None => break,
                };
            }
            let winding = match winding {
                Some(winding) => winding,
                None => {
                    warn!("Head node portal {} clipped away", i);
                    continue;
                }
            };

            let id = self.alloc_portal(tree, ProcPortal::new(*plane, None, winding));
            tree.add_portal_to_nodes(id, head_node, outside_node);
        }
    }

    /// The node plane clipped by the half-spaces of all its ancestors.
    pub fn get_base_winding_for_node(&self, tree: &BspTree, node: usize) -> Option<ProcWinding> {
        let plane_num = tree.nodes[node].plane_num()?;
        let planes = &self.proc_file.planes;

        let mut winding = ProcWinding::from_plane(&planes[plane_num]);
        let mut child = node;
        let mut parent = tree.nodes[node].parent;

        while let Some(n) = parent {
            let (parent_plane, children) = match tree.nodes[n].kind {
                BspNodeKind::Internal { plane_num, children } => (planes[plane_num], children),
                BspNodeKind::Leaf(_) => panic!("parent {} of node {} is a leaf", n, child),
            };
            winding = if children[0] == child {
                // Take front.
                winding.clip(&parent_plane, BASE_WINDING_EPSILON, false)?
            } else {
                // Take back.
                winding.clip(&-parent_plane, BASE_WINDING_EPSILON, false)?
            };
            child = n;
            parent = tree.nodes[n].parent;
        }

        Some(winding)
    }

    /// Create the portal on the plane of `node`, bounded by the portals that
    /// already touch it, and link it between its children.
    pub fn make_node_portal(&mut self, tree: &mut BspTree, node: usize) {
        let (plane_num, children) = match tree.nodes[node].kind {
            BspNodeKind::Internal { plane_num, children } => (plane_num, children),
            BspNodeKind::Leaf(_) => return,
        };

        let mut winding = self.get_base_winding_for_node(tree, node);

        // Clip the portal by all the other portals in the node.
        for &id in &tree.nodes[node].portals {
            let w = match winding {
                Some(w) => w,
                None => break,
            };
            let portal = tree.portal(id);
            let plane = match portal.side_of(node) {
                Some(0) => portal.plane,
                Some(_) => -portal.plane,
                None => panic!("make_node_portal: mislinked portal {}", id),
            };
            winding = w.clip(&plane, CLIP_EPSILON, false);
        }

        let winding = match winding {
            Some(winding) => winding,
            None => return,
        };

        if winding.is_tiny() {
            self.num_tiny_portals += 1;
            return;
        }

        let plane = self.proc_file.planes[plane_num];
        let id = self.alloc_portal(tree, ProcPortal::new(plane, Some(node), winding));
        tree.add_portal_to_nodes(id, children[0], children[1]);
    }

    /// Move the portals of `node` to its children, splitting those that
    /// straddle the node plane.
    pub fn split_node_portals(&mut self, tree: &mut BspTree, node: usize) {
        let (plane_num, children) = match tree.nodes[node].kind {
            BspNodeKind::Internal { plane_num, children } => (plane_num, children),
            BspNodeKind::Leaf(_) => return,
        };
        let plane = self.proc_file.planes[plane_num];
        let [front_child, back_child] = children;

        let portal_ids = tree.nodes[node].portals.clone();
        for id in portal_ids {
            let portal = tree.portal(id);
            let side = match portal.side_of(node) {
                Some(side) => side,
                None => panic!("split_node_portals: mislinked portal {}", id),
            };
            let other_node = match portal.nodes[side ^ 1] {
                Some(other_node) => other_node,
                None => panic!("split_node_portals: portal {} is half linked", id),
            };

            if let [Some(front), Some(back)] = tree.portal(id).nodes {
                tree.remove_portal_from_node(id, front);
                tree.remove_portal_from_node(id, back);
            }

            // Cut the portal into two portals, one on each side of the cut plane.
            let (front_winding, back_winding) = match tree.portal(id).winding.split(&plane, SPLIT_WINDING_EPSILON) {
                WindingSplit::Front => (Some(None), None),
                WindingSplit::Back => (None, Some(None)),
                WindingSplit::Split(front, back) => (Some(Some(front)), Some(Some(back))),
            };

            // A `Some(None)` fragment is the whole, unsplit winding.
            let front_winding = self.drop_tiny_fragment(front_winding);
            let back_winding = self.drop_tiny_fragment(back_winding);

            let link = |child: usize| if side == 0 { (child, other_node) } else { (other_node, child) };

            match (front_winding, back_winding) {
                (None, None) => {
                    // Tiny windings on both sides.
                    self.free_portal(tree, id);
                }
                (Some(_), None) => {
                    // Only the front survives, keep the original winding.
                    let (f, b) = link(front_child);
                    tree.add_portal_to_nodes(id, f, b);
                }
                (None, Some(_)) => {
                    let (f, b) = link(back_child);
                    tree.add_portal_to_nodes(id, f, b);
                }
                (Some(front), Some(back)) => {
                    // The winding is split.
                    let mut back_portal = tree.portal(id).clone();
                    back_portal.nodes = [None, None];
                    if let Some(back) = back {
                        back_portal.winding = back;
                    }
                    if let Some(front) = front {
                        tree.portal_mut(id).winding = front;
                    }
                    let back_id = self.alloc_portal(tree, back_portal);

                    let (f, b) = link(front_child);
                    tree.add_portal_to_nodes(id, f, b);
                    let (f, b) = link(back_child);
                    tree.add_portal_to_nodes(back_id, f, b);
                }
            }
        }

        debug_assert!(tree.nodes[node].portals.is_empty());
    }

    fn drop_tiny_fragment(&mut self, fragment: Option<Option<ProcWinding>>) -> Option<Option<ProcWinding>> {
        match fragment {
            Some(Some(winding)) if winding.is_tiny() => {
                self.num_tiny_portals += 1;
                None
            }
            fragment => fragment,
        }
    }

    /// Bounds of all the portal windings touching `node`.
    pub fn calculate_node_bounds(&self, tree: &BspTree, node: usize) -> Bounds {
        let mut bounds = Bounds::new();
        for &id in &tree.nodes[node].portals {
            bounds.add_points(&tree.portal(id).winding.points);
        }
        bounds
    }

    pub fn make_tree_portals_recursively(&mut self, tree: &mut BspTree, node: usize) {
        let bounds = self.calculate_node_bounds(tree, node);
        if !bounds.has_volume() {
            warn!("Node {} without a volume", node);
        } else if (0..3).any(|axis| bounds.min[axis] < MIN_WORLD_COORD || bounds.max[axis] > MAX_WORLD_COORD) {
            warn!("Node {} with unbounded volume", node);
        }
        tree.nodes[node].bounds = bounds;

        let children = match tree.nodes[node].children() {
            Some(children) => children,
            None => return,
        };

        self.make_node_portal(tree, node);
        self.split_node_portals(tree, node);

        self.make_tree_portals_recursively(tree, children[0]);
        self.make_tree_portals_recursively(tree, children[1]);
    }

    /// Build the portal graph of a finished tree.
    pub fn make_tree_portals(&mut self, tree: &mut BspTree) {
        if tree.nodes[tree.head_node].is_leaf() {
            debug!("Single leaf tree, no portals");
            return;
        }

        let head_node = tree.head_node;
        self.make_head_node_portals(tree);
        self.make_tree_portals_recursively(tree, head_node);

        info!("{} portals, {} peak, {} tiny", tree.num_portals(), self.num_peak_portals, self.num_tiny_portals);
    }
}

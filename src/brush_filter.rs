use log::info;

use crate::brush::ProcBrush;
use crate::bsp_tree::{BspNodeKind, BspTree};
use crate::compiler::ProcCompiler;
use crate::contents::ContentFlags;

impl<'a> ProcCompiler<'a> {
    /// Push a copy of every brush of the entity through the tree. Leaves end
    /// up owning the fragments that occupy them.
    pub fn filter_brushes_into_tree(&mut self, entity_num: usize, tree: &mut BspTree) {
        let mut num_unique_brushes = 0;
        let mut num_clusters = 0;

        for brush in &self.proc_file.entities[entity_num].brushes {
            num_unique_brushes += 1;
            num_clusters += self.filter_brush_into_tree_recursively(brush.clone(), tree.head_node, tree);
        }

        self.num_unique_brushes += num_unique_brushes;
        self.num_clusters += num_clusters;

        info!("{} unique brushes, {} clusters", num_unique_brushes, num_clusters);
    }

    /// Returns the number of leaves that received a fragment.
    pub fn filter_brush_into_tree_recursively(&self, brush: ProcBrush, node: usize, tree: &mut BspTree) -> usize {
        match &mut tree.nodes[node].kind {
            BspNodeKind::Leaf(leaf) => {
                // Only structural brushes classify the leaf, detail
                // fragments are stored without sealing it.
                if brush.structural {
                    if brush.opaque {
                        leaf.opaque = true;
                    }
                    if brush.contents.contains(ContentFlags::AreaPortal) {
                        leaf.area_portal = true;
                    }
                }
                leaf.brushes.push(brush);
                1
            }
            BspNodeKind::Internal { plane_num, children } => {
                let (plane_num, children) = (*plane_num, *children);
                let (front, back) = self.split_brush(&brush, plane_num);

                let mut count = 0;
                if let Some(front) = front {
                    count += self.filter_brush_into_tree_recursively(front, children[0], tree);
                }
                if let Some(back) = back {
                    count += self.filter_brush_into_tree_recursively(back, children[1], tree);
                }
                count
            }
        }
    }

    /// Split a brush by one of the registered planes, leaving it untouched.
    pub fn split_brush(&self, brush: &ProcBrush, plane_num: usize) -> (Option<ProcBrush>, Option<ProcBrush>) {
        brush.split(plane_num, &self.proc_file.planes)
    }
}

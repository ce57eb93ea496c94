use crate::bounds::Bounds;
use crate::brush::ProcBrush;
use crate::math::{Plane, Vec3};
use crate::plane_set::PlaneSet;
use crate::winding::ProcWinding;

/// A candidate splitting polygon, taken from one structural brush side.
#[derive(Clone, Debug, PartialEq)]
pub struct BspFace {
    /// Always the even plane of its pair.
    pub plane_num: usize,
    /// Preferred splitter, lies on an areaportal side.
    pub portal: bool,
    /// Scratch flag for one split selection pass.
    pub checked: bool,
    pub winding: ProcWinding,
}

impl BspFace {
    pub fn new(plane_num: usize, portal: bool, winding: ProcWinding) -> BspFace {
        BspFace { plane_num, portal, checked: false, winding }
    }
}

/// Classification of a terminal cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafContent {
    /// Nothing has been decided about the leaf yet.
    Empty,
    /// Filled by an opaque brush, or a sealed void.
    Opaque,
    /// Reachable from beyond the world.
    Outside,
    /// Open space belonging to an area.
    Area(usize),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BspLeaf {
    pub opaque: bool,
    pub area_portal: bool,
    pub outside: bool,
    /// Flood distance from the nearest occupant, `None` if never reached.
    pub occupied: Option<usize>,
    /// Entity whose origin sits in this leaf.
    pub occupant: Option<usize>,
    pub area: Option<usize>,
    /// Brush fragments filtered into this leaf.
    pub brushes: Vec<ProcBrush>,
}

impl BspLeaf {
    pub fn content(&self) -> LeafContent {
        if self.opaque {
            LeafContent::Opaque
        } else if self.outside {
            LeafContent::Outside
        } else if let Some(area) = self.area {
            LeafContent::Area(area)
        } else {
            LeafContent::Empty
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BspNodeKind {
    /// `children[0]` is in front of the plane, `children[1]` behind it.
    Internal { plane_num: usize, children: [usize; 2] },
    Leaf(BspLeaf),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BspTreeNode {
    pub parent: Option<usize>,
    pub bounds: Bounds,
    /// Ids of the portals touching this node.
    pub portals: Vec<usize>,
    pub kind: BspNodeKind,
}

impl BspTreeNode {
    pub fn new_leaf(parent: Option<usize>, bounds: Bounds) -> BspTreeNode {
        BspTreeNode {
            parent,
            bounds,
            portals: Vec::new(),
            kind: BspNodeKind::Leaf(BspLeaf::default()),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, BspNodeKind::Leaf(_))
    }

    pub fn plane_num(&self) -> Option<usize> {
        match self.kind {
            BspNodeKind::Internal { plane_num, .. } => Some(plane_num),
            BspNodeKind::Leaf(_) => None,
        }
    }

    pub fn children(&self) -> Option<[usize; 2]> {
        match self.kind {
            BspNodeKind::Internal { children, .. } => Some(children),
            BspNodeKind::Leaf(_) => None,
        }
    }

    pub fn leaf(&self) -> Option<&BspLeaf> {
        match &self.kind {
            BspNodeKind::Leaf(leaf) => Some(leaf),
            BspNodeKind::Internal { .. } => None,
        }
    }

    pub fn leaf_mut(&mut self) -> Option<&mut BspLeaf> {
        match &mut self.kind {
            BspNodeKind::Leaf(leaf) => Some(leaf),
            BspNodeKind::Internal { .. } => None,
        }
    }
}

/// The boundary polygon between two nodes. The plane faces `nodes[0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcPortal {
    pub plane: Plane,
    /// Node whose plane created the portal, `None` for the head node portals.
    pub on_node: Option<usize>,
    /// Front and back node, `None` while unlinked.
    pub nodes: [Option<usize>; 2],
    pub winding: ProcWinding,
}

impl ProcPortal {
    pub fn new(plane: Plane, on_node: Option<usize>, winding: ProcWinding) -> ProcPortal {
        ProcPortal { plane, on_node, nodes: [None, None], winding }
    }

    /// Which side of the portal `node` is on: 0 for front, 1 for back.
    pub fn side_of(&self, node: usize) -> Option<usize> {
        if self.nodes[0] == Some(node) {
            Some(0)
        } else if self.nodes[1] == Some(node) {
            Some(1)
        } else {
            None
        }
    }

    /// The node on the other side from `node`.
    pub fn other_node(&self, node: usize) -> Option<usize> {
        match self.side_of(node) {
            Some(side) => self.nodes[side ^ 1],
            None => None,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.nodes[0].is_some() || self.nodes[1].is_some()
    }
}

/// Node and portal arena for one model.
#[derive(Clone, Debug, PartialEq)]
pub struct BspTree {
    pub nodes: Vec<BspTreeNode>,
    pub head_node: usize,
    /// Leaf standing for everything beyond the head node portals.
    pub outside_node: usize,
    portals: Vec<Option<ProcPortal>>,
    free_portals: Vec<usize>,
    pub bounds: Bounds,
}

impl Default for BspTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BspTree {
    pub fn new() -> BspTree {
        let mut outside = BspTreeNode::new_leaf(None, Bounds::new());
        if let Some(leaf) = outside.leaf_mut() {
            leaf.outside = true;
        }
        BspTree {
            nodes: vec![BspTreeNode::new_leaf(None, Bounds::new()), outside],
            head_node: 0,
            outside_node: 1,
            portals: Vec::new(),
            free_portals: Vec::new(),
            bounds: Bounds::new(),
        }
    }

    pub fn alloc_node(&mut self, parent: Option<usize>, bounds: Bounds) -> usize {
        self.nodes.push(BspTreeNode::new_leaf(parent, bounds));
        self.nodes.len() - 1
    }

    pub fn node(&self, node: usize) -> &BspTreeNode {
        &self.nodes[node]
    }

    pub fn leaf(&self, node: usize) -> Option<&BspLeaf> {
        self.nodes[node].leaf()
    }

    pub fn leaf_mut(&mut self, node: usize) -> Option<&mut BspLeaf> {
        self.nodes[node].leaf_mut()
    }

    pub fn alloc_portal(&mut self, portal: ProcPortal) -> usize {
        match self.free_portals.pop() {
            Some(id) => {
                self.portals[id] = Some(portal);
                id
            }
            None => {
                self.portals.push(Some(portal));
                self.portals.len() - 1
            }
        }
    }

    /// Release a portal slot. The portal must already be unlinked.
    pub fn free_portal(&mut self, id: usize) -> ProcPortal {
        let portal = match self.portals.get_mut(id).and_then(Option::take) {
            Some(portal) => portal,
            None => panic!("portal {} freed twice", id),
        };
        assert!(!portal.is_linked(), "freeing linked portal {}", id);
        self.free_portals.push(id);
        portal
    }

    pub fn portal(&self, id: usize) -> &ProcPortal {
        match self.portals.get(id) {
            Some(Some(portal)) => portal,
            _ => panic!("portal {} is not allocated", id),
        }
    }

    pub fn portal_mut(&mut self, id: usize) -> &mut ProcPortal {
        match self.portals.get_mut(id) {
            Some(Some(portal)) => portal,
            _ => panic!("portal {} is not allocated", id),
        }
    }

    /// Every allocated portal with its id.
    pub fn portals(&self) -> impl Iterator<Item = (usize, &ProcPortal)> + '_ {
        self.portals.iter().enumerate().filter_map(|(id, portal)| portal.as_ref().map(|portal| (id, portal)))
    }

    pub fn num_portals(&self) -> usize {
        self.portals.len() - self.free_portals.len()
    }

    /// Link a portal between a front and a back node.
    pub fn add_portal_to_nodes(&mut self, id: usize, front: usize, back: usize) {
        let portal = self.portal_mut(id);
        assert!(!portal.is_linked(), "portal {} already included", id);
        portal.nodes = [Some(front), Some(back)];
        self.nodes[front].portals.push(id);
        self.nodes[back].portals.push(id);
    }

    /// Unlink a portal from one of its nodes.
    pub fn remove_portal_from_node(&mut self, id: usize, node: usize) {
        let position = self.nodes[node].portals.iter().position(|&p| p == id);
        let position = match position {
            Some(position) => position,
            None => panic!("portal {} not in node {}", id, node),
        };
        self.nodes[node].portals.remove(position);

        let portal = self.portal_mut(id);
        match portal.side_of(node) {
            Some(side) => portal.nodes[side] = None,
            None => panic!("portal {} is not linked to node {}", id, node),
        }
    }

    /// Walk down from the head node to the leaf containing `point`. Points on
    /// a plane go to the front.
    pub fn point_in_leaf(&self, point: Vec3, planes: &PlaneSet) -> usize {
        let mut node = self.head_node;
        while let BspNodeKind::Internal { plane_num, children } = self.nodes[node].kind {
            node = if planes[plane_num].distance(point) >= 0.0 { children[0] } else { children[1] };
        }
        node
    }

    /// Leaves reachable from the head node, in depth first order.
    pub fn leaf_nodes(&self) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.head_node];
        while let Some(node) = stack.pop() {
            match self.nodes[node].kind {
                BspNodeKind::Internal { children, .. } => {
                    stack.push(children[1]);
                    stack.push(children[0]);
                }
                BspNodeKind::Leaf(_) => leaves.push(node),
            }
        }
        leaves
    }

    pub fn num_internal_nodes(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_leaf()).count()
    }

    pub fn leaf_content(&self, node: usize) -> Option<LeafContent> {
        self.leaf(node).map(BspLeaf::content)
    }

    /// Check that every portal is referenced by exactly the two nodes it
    /// links, and that nodes only reference portals linked to them.
    pub fn portal_links_are_consistent(&self) -> bool {
        for (id, portal) in self.portals() {
            for node in portal.nodes {
                let node = match node {
                    Some(node) => node,
                    None => return false,
                };
                if self.nodes[node].portals.iter().filter(|&&p| p == id).count() != 1 {
                    return false;
                }
            }
            if portal.nodes[0] == portal.nodes[1] {
                return false;
            }
        }
        self.nodes.iter().enumerate().all(|(index, node)| {
            node.portals.iter().all(|&id| {
                matches!(self.portals.get(id), Some(Some(portal)) if portal.side_of(index).is_some())
            })
        })
    }
}

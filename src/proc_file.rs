use crate::brush::ProcBrush;
use crate::bsp_tree::BspTree;
use crate::error::CompileError;
use crate::math::Vec3;
use crate::plane_set::PlaneSet;
use crate::winding::ProcWinding;

/// One triangle of visible geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcTri {
    pub material: String,
    pub vertices: [Vec3; 3],
}

impl ProcTri {
    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }
}

/// Visible geometry of one area.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcArea {
    pub triangles: Vec<ProcTri>,
}

/// The areaportal side separating two areas.
#[derive(Clone, Debug, PartialEq)]
pub struct InterAreaPortal {
    /// The lower area number comes first.
    pub areas: [usize; 2],
    pub brush_num: usize,
    pub side_num: usize,
    pub winding: ProcWinding,
}

/// Counters collected while compiling one model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub num_faces: usize,
    pub num_nodes: usize,
    pub num_leaves: usize,
    pub num_portals: usize,
    pub num_peak_portals: usize,
    pub num_tiny_portals: usize,
    pub num_unique_brushes: usize,
    pub num_clusters: usize,
    pub num_outside_leaves: usize,
    pub num_sealed_leaves: usize,
    pub num_dropped_triangles: usize,
}

/// Compiled form of one scene entity.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcEntity {
    pub entity_num: usize,
    pub key_values: Vec<(String, String)>,
    pub origin: Vec3,
    pub brushes: Vec<ProcBrush>,
    /// Patch triangles in model space.
    pub patch_triangles: Vec<ProcTri>,
    pub tree: BspTree,
    pub num_areas: usize,
    pub areas: Vec<ProcArea>,
    pub inter_area_portals: Vec<InterAreaPortal>,
    pub stats: CompileStats,
    /// Portal centres from the outside toward the entity that leaked.
    pub leak_trail: Vec<Vec3>,
    pub error: Option<CompileError>,
}

impl ProcEntity {
    pub fn new(entity_num: usize) -> ProcEntity {
        ProcEntity {
            entity_num,
            key_values: Vec::new(),
            origin: Vec3::new(0.0, 0.0, 0.0),
            brushes: Vec::new(),
            patch_triangles: Vec::new(),
            tree: BspTree::new(),
            num_areas: 0,
            areas: Vec::new(),
            inter_area_portals: Vec::new(),
            stats: CompileStats::default(),
            leak_trail: Vec::new(),
            error: None,
        }
    }

    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.key_values.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }

    pub fn has_primitives(&self) -> bool {
        !self.brushes.is_empty() || !self.patch_triangles.is_empty()
    }
}

/// Everything a compilation produced: the shared planes and one entry per
/// scene entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcFile {
    pub planes: PlaneSet,
    pub entities: Vec<ProcEntity>,
}

impl ProcFile {
    pub fn new() -> ProcFile {
        ProcFile::default()
    }

    pub fn world(&self) -> Option<&ProcEntity> {
        self.entities.first()
    }
}

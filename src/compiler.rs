use log::{debug, error, info, warn};

use crate::brush::ProcBrush;
use crate::bsp_tree::BspTree;
use crate::error::CompileError;
use crate::flood::FloodResult;
use crate::math::Vec3;
use crate::proc_file::{CompileStats, ProcEntity, ProcFile, ProcTri};
use crate::scene::{parse_vector, PrimitiveRef, SceneRoot};

/// Weights of the split plane heuristic. A candidate scores
/// `facing * facing - splits * split - |front - back| * balance`, plus
/// `axial_bonus` when its plane is axial. The highest score wins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitWeights {
    /// Reward per face lying on the candidate plane.
    pub facing: i64,
    /// Penalty per face the candidate would cut.
    pub split: i64,
    /// Penalty per face of imbalance between the front and back lists.
    pub balance: i64,
    pub axial_bonus: i64,
}

impl Default for SplitWeights {
    fn default() -> Self {
        SplitWeights {
            facing: 5,
            split: 5,
            balance: 1,
            axial_bonus: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompilerOptions {
    /// Flood fill the world from its entities and discard the outside.
    pub flood_fill: bool,
    /// Force splits along a grid of this size before any face is used.
    pub block_size: Option<f64>,
    pub split_weights: SplitWeights,
    /// Structural faces smaller than this are dropped.
    pub min_face_area: f64,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            flood_fill: true,
            block_size: Some(1024.0),
            split_weights: SplitWeights::default(),
            min_face_area: 0.1,
        }
    }
}

/// Turns a scene into a ProcFile.
///
/// The compiler owns all working state of one run: the plane set (inside the
/// ProcFile being built), the current model's face list and the portal
/// counters. Each call to `generate_proc_file` starts from scratch.
pub struct ProcCompiler<'a> {
    pub(crate) root: &'a dyn SceneRoot,
    pub(crate) options: CompilerOptions,
    pub(crate) proc_file: ProcFile,
    pub(crate) num_active_portals: usize,
    pub(crate) num_peak_portals: usize,
    pub(crate) num_tiny_portals: usize,
    pub(crate) num_unique_brushes: usize,
    pub(crate) num_clusters: usize,
}

impl<'a> ProcCompiler<'a> {
    pub fn new(root: &'a dyn SceneRoot) -> ProcCompiler<'a> {
        ProcCompiler::with_options(root, CompilerOptions::default())
    }

    pub fn with_options(root: &'a dyn SceneRoot, options: CompilerOptions) -> ProcCompiler<'a> {
        ProcCompiler {
            root,
            options,
            proc_file: ProcFile::new(),
            num_active_portals: 0,
            num_peak_portals: 0,
            num_tiny_portals: 0,
            num_unique_brushes: 0,
            num_clusters: 0,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// The ProcFile under construction.
    pub fn proc_file(&self) -> &ProcFile {
        &self.proc_file
    }

    pub fn proc_file_mut(&mut self) -> &mut ProcFile {
        &mut self.proc_file
    }

    /// Compile the whole scene. Failures of single models are recorded on
    /// their ProcEntity, only an empty scene fails the run.
    pub fn generate_proc_file(&mut self) -> Result<ProcFile, CompileError> {
        self.proc_file = ProcFile::new();

        self.generate_brush_data()?;
        self.process_models();

        Ok(std::mem::take(&mut self.proc_file))
    }

    /// Convert every brush and patch of the scene into compiler primitives,
    /// registering all brush planes.
    pub fn generate_brush_data(&mut self) -> Result<(), CompileError> {
        let root = self.root;
        let entities = root.entities();
        if entities.is_empty() {
            return Err(CompileError::NoEntities);
        }

        let mut num_brushes = 0;
        let mut num_patch_triangles = 0;

        for (entity_num, entity) in entities.iter().enumerate() {
            let mut proc_entity = ProcEntity::new(entity_num);
            proc_entity.key_values = entity.key_values();

            // The world is never offset.
            if entity_num != 0 {
                if let Some(origin) = entity.key_value("origin").and_then(parse_vector) {
                    proc_entity.origin = origin;
                }
            }
            let origin = proc_entity.origin;

            for primitive in entity.primitives() {
                match primitive {
                    PrimitiveRef::Brush(map_brush) => {
                        let brush_num = proc_entity.brushes.len();
                        match ProcBrush::from_map_brush(map_brush, entity_num, brush_num, origin, &mut self.proc_file.planes) {
                            Ok(brush) => proc_entity.brushes.push(brush),
                            Err(reason) => {
                                warn!("Entity {}, Brush {}: {}", entity_num, brush_num, reason);
                                if proc_entity.error.is_none() {
                                    proc_entity.error = Some(CompileError::InvalidBrush { entity: entity_num, brush: brush_num, reason });
                                }
                            }
                        }
                    }
                    PrimitiveRef::Patch(patch) => {
                        for triangle in patch.indices.chunks_exact(3) {
                            let vertices = match (patch.vertices.get(triangle[0]), patch.vertices.get(triangle[1]), patch.vertices.get(triangle[2])) {
                                (Some(a), Some(b), Some(c)) => [*a - origin, *b - origin, *c - origin],
                                _ => {
                                    warn!("Entity {}: patch index out of range", entity_num);
                                    continue;
                                }
                            };
                            proc_entity.patch_triangles.push(ProcTri { material: patch.material.clone(), vertices });
                        }
                    }
                }
            }

            num_brushes += proc_entity.brushes.len();
            num_patch_triangles += proc_entity.patch_triangles.len();
            self.proc_file.entities.push(proc_entity);
        }

        info!("{} entities, {} brushes, {} patch triangles, {} planes", entities.len(), num_brushes, num_patch_triangles, self.proc_file.planes.len());

        Ok(())
    }

    /// Compile every entity that has geometry. A failed model does not stop
    /// the others.
    pub fn process_models(&mut self) {
        for entity_num in 0..self.proc_file.entities.len() {
            let entity = &self.proc_file.entities[entity_num];
            if let Some(err) = &entity.error {
                error!("Entity {} skipped: {}", entity_num, err);
                continue;
            }
            if !entity.has_primitives() {
                continue;
            }

            info!("############### entity {} ###############", entity_num);

            // Only the world gets flood filled.
            let flood_fill = entity_num == 0 && self.options.flood_fill;
            if let Err(err) = self.process_model(entity_num, flood_fill) {
                error!("Entity {} failed: {}", entity_num, err);
                self.proc_file.entities[entity_num].error = Some(err);
            }
        }
    }

    /// Build the tree, portals and areas of one entity.
    pub fn process_model(&mut self, entity_num: usize, flood_fill: bool) -> Result<(), CompileError> {
        self.num_active_portals = 0;
        self.num_peak_portals = 0;
        self.num_tiny_portals = 0;
        self.num_unique_brushes = 0;
        self.num_clusters = 0;

        let faces = self.make_structural_face_list(entity_num);
        let num_faces = faces.len();
        if faces.is_empty() {
            info!("Entity {} has no structural faces", entity_num);
        }

        let mut tree = self.face_bsp(faces);
        self.make_tree_portals(&mut tree);
        self.filter_brushes_into_tree(entity_num, &mut tree);

        let mut stats = CompileStats {
            num_faces,
            num_nodes: tree.num_internal_nodes(),
            num_leaves: tree.leaf_nodes().len(),
            ..CompileStats::default()
        };

        if flood_fill {
            match self.flood_entities(entity_num, &mut tree) {
                FloodResult::Sealed => {
                    let (num_outside, num_sealed) = self.fill_outside(&mut tree);
                    stats.num_outside_leaves = num_outside;
                    stats.num_sealed_leaves = num_sealed;
                }
                FloodResult::NoOccupants => {}
                FloodResult::Leaked => {
                    let leak_trail = self.leak_trail(&tree);
                    warn!("Entity {} leaked, trail has {} points", entity_num, leak_trail.len());
                    self.record_stats(&mut stats, &tree);
                    let entity = &mut self.proc_file.entities[entity_num];
                    entity.leak_trail = leak_trail;
                    entity.stats = stats;
                    entity.tree = tree;
                    return Err(CompileError::Leaked { entity: entity_num });
                }
            }
        }

        let num_areas = self.flood_areas(entity_num, &mut tree);
        let inter_area_portals = self.find_inter_area_portals(entity_num, &tree);
        let (areas, num_dropped) = self.put_primitives_in_areas(entity_num, &tree, num_areas);
        stats.num_dropped_triangles = num_dropped;
        self.record_stats(&mut stats, &tree);

        debug!("Entity {}: {:?}", entity_num, stats);

        let entity = &mut self.proc_file.entities[entity_num];
        entity.num_areas = num_areas;
        entity.areas = areas;
        entity.inter_area_portals = inter_area_portals;
        entity.stats = stats;
        entity.tree = tree;

        Ok(())
    }

    fn record_stats(&self, stats: &mut CompileStats, tree: &BspTree) {
        stats.num_portals = tree.num_portals();
        stats.num_peak_portals = self.num_peak_portals;
        stats.num_tiny_portals = self.num_tiny_portals;
        stats.num_unique_brushes = self.num_unique_brushes;
        stats.num_clusters = self.num_clusters;
    }

    /// Origins of every entity other than `entity_num`, in that entity's
    /// model space.
    pub(crate) fn occupant_origins(&self, entity_num: usize) -> Vec<(usize, Vec3)> {
        let model_origin = self.proc_file.entities[entity_num].origin;
        self.proc_file.entities.iter()
            .filter(|entity| entity.entity_num != entity_num)
            .filter_map(|entity| {
                entity.key_value("origin").and_then(parse_vector).map(|origin| (entity.entity_num, origin - model_origin))
            })
            .collect()
    }
}

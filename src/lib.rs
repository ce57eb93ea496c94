pub mod math;
pub mod bounds;
pub mod winding;
pub mod plane_set;
pub mod contents;
pub mod scene;
pub mod error;
pub mod brush;
pub mod bsp_tree;
pub mod proc_file;
pub mod compiler;
pub mod face_bsp;
pub mod portals;
pub mod brush_filter;
pub mod flood;

pub use compiler::{CompilerOptions, ProcCompiler, SplitWeights};
pub use error::{BrushError, CompileError};
pub use proc_file::ProcFile;

#[cfg(feature = "python")]
mod python {
    use std::collections::HashSet;

    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::compiler::{CompilerOptions, ProcCompiler};
    use crate::contents::ContentFlags;
    use crate::math::{Plane, Vec3};
    use crate::proc_file::ProcEntity;
    use crate::scene::{MapBrush, MapBrushSide, MapEntity, MapScene};

    #[pyclass]
    #[derive(Clone)]
    struct BrushSide {
        normal: (f64, f64, f64),
        dist: f64,
        material: String,
        contents: HashSet<String>,
    }

    #[pymethods]
    impl BrushSide {
        #[new]
        fn new(normal: (f64, f64, f64), dist: f64, material: String, contents: HashSet<String>) -> Self {
            BrushSide { normal, dist, material, contents }
        }
    }

    impl From<&BrushSide> for MapBrushSide {
        fn from(side: &BrushSide) -> Self {
            let (x, y, z) = side.normal;
            let contents = ContentFlags::from_names(side.contents.iter().map(String::as_str));
            MapBrushSide::new(Plane::new(Vec3::new(x, y, z), side.dist), &side.material, contents)
        }
    }

    #[pyclass]
    #[derive(Clone)]
    struct Brush {
        sides: Vec<BrushSide>,
    }

    #[pymethods]
    impl Brush {
        #[new]
        fn new(sides: Vec<PyRef<BrushSide>>) -> Self {
            Brush { sides: sides.iter().map(|side| (**side).clone()).collect() }
        }
    }

    #[pyclass]
    struct Entity {
        key_values: Vec<(String, String)>,
        brushes: Vec<Brush>,
    }

    #[pymethods]
    impl Entity {
        #[new]
        fn new(key_values: Vec<(String, String)>, brushes: Vec<PyRef<Brush>>) -> Self {
            Entity {
                key_values,
                brushes: brushes.iter().map(|brush| (**brush).clone()).collect(),
            }
        }
    }

    impl From<&PyRef<'_, Entity>> for MapEntity {
        fn from(entity: &PyRef<Entity>) -> Self {
            let mut map_entity = MapEntity::default();
            for (key, value) in &entity.key_values {
                map_entity.set_key_value(key, value);
            }
            for brush in &entity.brushes {
                map_entity.add_brush(MapBrush::new(brush.sides.iter().map(MapBrushSide::from).collect()));
            }
            map_entity
        }
    }

    #[pyclass]
    #[derive(Clone, Debug)]
    struct EntitySummary {
        #[pyo3(get)]
        pub entity_num: usize,
        #[pyo3(get)]
        pub num_nodes: usize,
        #[pyo3(get)]
        pub num_leaves: usize,
        #[pyo3(get)]
        pub num_portals: usize,
        #[pyo3(get)]
        pub num_areas: usize,
        #[pyo3(get)]
        pub leak_trail: Vec<(f64, f64, f64)>,
        #[pyo3(get)]
        pub error: Option<String>,
    }

    impl From<&ProcEntity> for EntitySummary {
        fn from(entity: &ProcEntity) -> Self {
            EntitySummary {
                entity_num: entity.entity_num,
                num_nodes: entity.stats.num_nodes,
                num_leaves: entity.stats.num_leaves,
                num_portals: entity.stats.num_portals,
                num_areas: entity.num_areas,
                leak_trail: entity.leak_trail.iter().map(|point| (point.x, point.y, point.z)).collect(),
                error: entity.error.as_ref().map(|err| err.to_string()),
            }
        }
    }

    #[pyclass]
    struct ProcSummary {
        #[pyo3(get)]
        pub num_planes: usize,
        #[pyo3(get)]
        pub entities: Vec<EntitySummary>,
    }

    /// Compile the entities, the first one being the world.
    #[pyfunction]
    #[pyo3(signature = (entities, flood_fill = true))]
    fn compile(entities: Vec<PyRef<Entity>>, flood_fill: bool) -> PyResult<ProcSummary> {
        let mut scene = MapScene::new();
        for entity in &entities {
            scene.add_entity(MapEntity::from(entity));
        }

        let options = CompilerOptions { flood_fill, ..CompilerOptions::default() };
        let mut compiler = ProcCompiler::with_options(&scene, options);
        let proc_file = compiler.generate_proc_file().map_err(|err| PyValueError::new_err(err.to_string()))?;

        Ok(ProcSummary {
            num_planes: proc_file.planes.len(),
            entities: proc_file.entities.iter().map(EntitySummary::from).collect(),
        })
    }

    #[pymodule]
    fn proc_compiler(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<BrushSide>()?;
        m.add_class::<Brush>()?;
        m.add_class::<Entity>()?;
        m.add_class::<EntitySummary>()?;
        m.add_class::<ProcSummary>()?;
        m.add_function(wrap_pyfunction!(compile, m)?)?;
        Ok(())
    }
}

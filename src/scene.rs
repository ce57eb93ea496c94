//! Read-only view of the map the compiler consumes.
//!
//! The editor's scene graph stays on its side of this boundary: the compiler
//! only asks for the entities, their key/values and their primitives.

use crate::contents::ContentFlags;
use crate::math::{Plane, Vec3};

/// One side of a map brush: the outward facing plane plus what its material
/// says about the space behind it.
#[derive(Clone, Debug, PartialEq)]
pub struct MapBrushSide {
    pub plane: Plane,
    pub material: String,
    pub contents: ContentFlags,
}

impl MapBrushSide {
    pub fn new(plane: Plane, material: &str, contents: ContentFlags) -> MapBrushSide {
        MapBrushSide { plane, material: material.to_string(), contents }
    }
}

/// A convex brush described by the planes bounding it.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MapBrush {
    pub sides: Vec<MapBrushSide>,
}

impl MapBrush {
    pub fn new(sides: Vec<MapBrushSide>) -> MapBrush {
        MapBrush { sides }
    }

    /// An axis aligned box brush with the same material on every side.
    pub fn axial_box(min: Vec3, max: Vec3, material: &str, contents: ContentFlags) -> MapBrush {
        let mut sides = Vec::with_capacity(6);
        for axis in 0..3 {
            let mut normal = Vec3::new(0.0, 0.0, 0.0);
            normal[axis] = 1.0;
            sides.push(MapBrushSide::new(Plane::new(normal, max[axis]), material, contents));
            sides.push(MapBrushSide::new(Plane::new(-normal, -min[axis]), material, contents));
        }
        MapBrush { sides }
    }

    /// Union of the content flags of all sides.
    pub fn contents(&self) -> ContentFlags {
        self.sides.iter().fold(ContentFlags::empty(), |flags, side| flags | side.contents)
    }
}

/// A patch mesh, already tessellated into triangles.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MapPatch {
    pub material: String,
    pub contents: ContentFlags,
    pub vertices: Vec<Vec3>,
    pub indices: Vec<usize>,
}

/// A primitive handed out by an entity.
#[derive(Clone, Copy, Debug)]
pub enum PrimitiveRef<'a> {
    Brush(&'a MapBrush),
    Patch(&'a MapPatch),
}

/// An entity of the map being compiled.
pub trait EntityNode {
    fn key_value(&self, key: &str) -> Option<&str>;

    /// Every key/value pair, in a stable order.
    fn key_values(&self) -> Vec<(String, String)>;

    /// Every brush and patch that belongs to the entity.
    fn primitives(&self) -> Vec<PrimitiveRef<'_>>;
}

/// The root of the map. Entity 0 is the world.
pub trait SceneRoot {
    fn entities(&self) -> Vec<&dyn EntityNode>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapPrimitive {
    Brush(MapBrush),
    Patch(MapPatch),
}

/// Plain in-memory entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapEntity {
    pub key_values: Vec<(String, String)>,
    pub primitives: Vec<MapPrimitive>,
}

impl MapEntity {
    pub fn new(classname: &str) -> MapEntity {
        MapEntity {
            key_values: vec![("classname".to_string(), classname.to_string())],
            primitives: Vec::new(),
        }
    }

    /// Set a key, replacing an existing value.
    pub fn set_key_value(&mut self, key: &str, value: &str) {
        match self.key_values.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.key_values.push((key.to_string(), value.to_string())),
        }
    }

    pub fn with_origin(mut self, origin: Vec3) -> MapEntity {
        self.set_key_value("origin", &format!("{} {} {}", origin.x, origin.y, origin.z));
        self
    }

    pub fn add_brush(&mut self, brush: MapBrush) {
        self.primitives.push(MapPrimitive::Brush(brush));
    }

    pub fn add_patch(&mut self, patch: MapPatch) {
        self.primitives.push(MapPrimitive::Patch(patch));
    }
}

impl EntityNode for MapEntity {
    fn key_value(&self, key: &str) -> Option<&str> {
        self.key_values.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }

    fn key_values(&self) -> Vec<(String, String)> {
        self.key_values.clone()
    }

    fn primitives(&self) -> Vec<PrimitiveRef<'_>> {
        self.primitives.iter().map(|primitive| match primitive {
            MapPrimitive::Brush(brush) => PrimitiveRef::Brush(brush),
            MapPrimitive::Patch(patch) => PrimitiveRef::Patch(patch),
        }).collect()
    }
}

/// Plain in-memory map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapScene {
    pub entities: Vec<MapEntity>,
}

impl MapScene {
    pub fn new() -> MapScene {
        MapScene { entities: Vec::new() }
    }

    /// Add an entity and return its index.
    pub fn add_entity(&mut self, entity: MapEntity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }
}

impl SceneRoot for MapScene {
    fn entities(&self) -> Vec<&dyn EntityNode> {
        self.entities.iter().map(|entity| entity as &dyn EntityNode).collect()
    }
}

/// Parse a "x y z" vector value.
pub fn parse_vector(value: &str) -> Option<Vec3> {
    let mut parts = value.split_whitespace().map(|part| part.parse::<f64>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    Some(Vec3::new(x, y, z))
}

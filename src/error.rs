use thiserror::Error;

/// Reasons a map brush can't be turned into a usable convex solid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrushError {
    #[error("side {side} has a zero length normal")]
    InvalidPlane { side: usize },
    #[error("side {side} is mirrored by another side")]
    MirroredPlane { side: usize },
    #[error("only {count} sides produced a winding")]
    TooFewSides { count: usize },
    #[error("bounds out of range")]
    BoundsOutOfRange,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("the map has no entities")]
    NoEntities,
    #[error("entity {entity}, brush {brush}: {reason}")]
    InvalidBrush { entity: usize, brush: usize, reason: BrushError },
    #[error("entity {entity} leaked")]
    Leaked { entity: usize },
}

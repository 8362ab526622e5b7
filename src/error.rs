//! Error types for level construction and body management.

use glam::Vec3;
use thiserror::Error;

use crate::physics::BodyId;

/// Errors raised while building or reconfiguring a simulation.
///
/// Per-tick processing never returns these; contact handling degrades
/// silently instead.
#[derive(Error, Debug)]
pub enum FlipsideError {
    #[error("gravity must be finite and non-zero, got {0}")]
    InvalidGravity(Vec3),

    #[error("invalid collider shape: {0}")]
    InvalidShape(String),

    #[error("body {0:?} is not part of the physics world")]
    UnknownBody(BodyId),

    #[error("entity {0:?} has no physics body")]
    MissingBody(hecs::Entity),

    #[error("a level needs exactly two players, found {0}")]
    PlayerCount(usize),
}

/// Result type for flipside operations.
pub type Result<T> = std::result::Result<T, FlipsideError>;

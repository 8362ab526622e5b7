//! Flipside
//!
//! Simulation core of a cooperative platformer where every player carries
//! its own gravity.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **math** - glam ⇄ physics engine conversions and vector helpers
//! 2. **physics** - Rigid-body world, body-pair contact events, entity registry
//! 3. **ecs** - hecs components and the transform hand-off
//! 4. **gravity** - Per-body gravity, jumping, gravity fields
//! 5. **trigger** - Ground detection and trigger regions
//! 6. **camera** - Gravity-aware follow camera
//! 7. **input** - Key and mouse state
//! 8. **level** - Level assembly and the per-tick driver
//!
//! # Example
//!
//! ```no_run
//! use flipside::{level::catalog, GameConfig, InputState, TickOutcome};
//!
//! let config = GameConfig::default();
//! let mut level = catalog::load(0, &config)?;
//! let mut input = InputState::new();
//! while level.tick(&mut input) == TickOutcome::Continue {}
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod camera;
pub mod config;
pub mod ecs;
pub mod error;
pub mod gravity;
pub mod input;
pub mod level;
pub mod math;
pub mod physics;
pub mod trigger;

// Re-export commonly used types
pub use config::{CameraConfig, GameConfig, PhysicsConfig, PlayerConfig};

pub use error::{FlipsideError, Result};

pub use physics::{
    BodyId, Contact, ContactEvent, ContactKind, EntityRegistry, ListenerId, PhysicsWorld,
};

pub use ecs::prelude::*;

pub use gravity::{apply_gravity_fields, apply_gravity_forces, GravityBody, RadialGravity};

pub use trigger::{
    ContactClassifier, TriggerContext, TriggerEffect, TriggerFilter, TriggerHit, TriggerRegion,
};

pub use camera::{input_velocity, CameraPose, FollowCamera, FollowTarget};

pub use input::{Bindings, Event, InputState, Key, MoveInput};

pub use level::{
    Level, LevelBuilder, LevelObjectDesc, LevelState, MovingPlatform, ObjectUpdate, PlatformDesc,
    TickOutcome, TriggerDesc,
};

// Re-export glam for convenience
pub use glam;

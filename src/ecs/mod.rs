//! Entity data for the game world.
//!
//! Entities live in a [`hecs::World`]. Gameplay capabilities are plain
//! components: a body is a [`PhysicsBody`](components::PhysicsBody), a
//! player a [`Player`](components::Player), and anything with its own
//! gravity carries a [`GravityBody`](crate::gravity::GravityBody).

pub mod components;
pub mod systems;

pub mod prelude {
    pub use super::components::{
        BodyDesc, BodyKind, CameraAngle, ColliderDesc, CollisionGroups, Name, PhysicsBody, Player,
        PlayerSlot, ShapeDesc, SurfaceMaterial, Transform,
    };
    pub use super::systems::sync_transforms;
}

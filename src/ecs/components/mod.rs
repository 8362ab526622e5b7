pub mod physics;
pub mod player;
pub mod transform;

pub use physics::{
    BodyDesc, BodyKind, ColliderDesc, CollisionGroups, CombineRule, PhysicsBody, ShapeDesc,
    SurfaceMaterial,
};
pub use player::{CameraAngle, Name, Player, PlayerSlot};
pub use transform::Transform;

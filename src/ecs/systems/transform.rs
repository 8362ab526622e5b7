//! Hand-off of body poses to render transforms.

use crate::ecs::components::physics::PhysicsBody;
use crate::ecs::components::transform::Transform;
use crate::physics::PhysicsWorld;

/// Copy each body's position and rotation into its entity's [`Transform`].
///
/// Entities whose body is gone keep their last transform.
pub fn sync_transforms(world: &mut hecs::World, physics: &PhysicsWorld) {
    for (_, (transform, body)) in world.query_mut::<(&mut Transform, &PhysicsBody)>() {
        let (Some(position), Some(rotation)) =
            (physics.translation(body.0), physics.rotation(body.0))
        else {
            continue;
        };
        transform.position = position;
        transform.rotation = rotation;
    }
}

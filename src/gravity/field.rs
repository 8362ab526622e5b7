//! Gravity fields that recompute a body's gravity every tick.

use glam::Vec3;

use super::GravityBody;
use crate::ecs::components::physics::PhysicsBody;
use crate::physics::PhysicsWorld;

/// Gravity pulling toward a point, as on a small planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGravity {
    pub center: Vec3,
    pub strength: f32,
}

impl RadialGravity {
    pub fn new(center: Vec3, strength: f32) -> Self {
        Self { center, strength }
    }

    /// Gravity at `position`, or `None` at the center where it has no
    /// direction.
    pub fn gravity_at(&self, position: Vec3) -> Option<Vec3> {
        (self.center - position)
            .try_normalize()
            .map(|dir| dir * self.strength)
    }
}

/// Steer every body standing in a field toward that field's gravity.
pub fn apply_gravity_fields(world: &mut hecs::World, physics: &PhysicsWorld) {
    for (_, (field, gravity, body)) in
        world.query_mut::<(&RadialGravity, &mut GravityBody, &PhysicsBody)>()
    {
        let Some(position) = physics.translation(body.0) else {
            continue;
        };
        if let Some(g) = field.gravity_at(position) {
            gravity.steer_gravity(g);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::ecs::components::physics::{BodyDesc, ShapeDesc};

    #[test]
    fn test_radial_gravity_points_at_center() {
        let field = RadialGravity::new(Vec3::ZERO, 9.81);
        let g = field.gravity_at(Vec3::new(0.0, 0.0, 10.0)).unwrap();
        assert!((g - Vec3::new(0.0, 0.0, -9.81)).length() < 1e-5);
        assert_eq!(field.gravity_at(Vec3::ZERO), None);
    }

    #[test]
    fn test_fields_steer_bodies_without_cooldown() {
        let mut physics = PhysicsWorld::default();
        let body = physics
            .add_body(
                &BodyDesc::dynamic(1.0)
                    .position(Vec3::new(3.0, 0.0, 0.0))
                    .collider(ShapeDesc::cuboid(0.5, 0.5, 0.5)),
            )
            .unwrap();
        let mut world = hecs::World::new();
        let entity = world.spawn((
            GravityBody::new(&PlayerConfig::default()).unwrap(),
            PhysicsBody(body),
            RadialGravity::new(Vec3::ZERO, 9.81),
        ));

        apply_gravity_fields(&mut world, &physics);
        let g = world.get::<&GravityBody>(entity).unwrap().gravity();
        assert!((g - Vec3::new(-9.81, 0.0, 0.0)).length() < 1e-5);

        physics.set_translation(body, Vec3::new(0.0, -2.0, 0.0));
        apply_gravity_fields(&mut world, &physics);
        let g = world.get::<&GravityBody>(entity).unwrap().gravity();
        assert!((g - Vec3::new(0.0, 9.81, 0.0)).length() < 1e-5);
    }
}

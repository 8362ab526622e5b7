//! Per-body gravity.
//!
//! World gravity is zero. Every entity with a [`GravityBody`] pushes itself
//! with `mass * gravity` before each step, so two players can fall in
//! different directions in the same world. The gravity vector is also the
//! only source of "up" for its owner.

pub mod field;

use std::collections::HashSet;

use glam::{Quat, Vec3};
use hecs::Entity;
use tracing::{debug, warn};

use crate::config::PlayerConfig;
use crate::ecs::components::physics::PhysicsBody;
use crate::error::{FlipsideError, Result};
use crate::math::{is_valid_gravity, up_from_gravity};
use crate::physics::{BodyId, PhysicsWorld};
use crate::trigger::grounding::is_ground_normal;

pub use field::{apply_gravity_fields, RadialGravity};

/// Gravity, jump and ground state of one body.
#[derive(Debug, Clone)]
pub struct GravityBody {
    gravity: Vec3,
    mass: f32,
    can_jump: bool,
    jump_velocity: f32,
    ground_threshold: f32,
    cooldown: f64,
    last_change: Option<f64>,
    base_damping: f32,
    jump_damping: f32,
    jump_damping_duration: f64,
    damping_until: Option<f64>,
    ground: HashSet<Entity>,
}

impl GravityBody {
    /// Create gravity state from player settings.
    pub fn new(config: &PlayerConfig) -> Result<Self> {
        if !is_valid_gravity(config.gravity) {
            return Err(FlipsideError::InvalidGravity(config.gravity));
        }
        Ok(Self {
            gravity: config.gravity,
            mass: config.mass,
            can_jump: false,
            jump_velocity: config.jump_velocity,
            ground_threshold: config.ground_threshold,
            cooldown: config.gravity_cooldown,
            last_change: None,
            base_damping: config.linear_damping,
            jump_damping: config.jump_damping,
            jump_damping_duration: config.jump_damping_duration,
            damping_until: None,
            ground: HashSet::new(),
        })
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Unit vector opposite to gravity.
    pub fn up(&self) -> Vec3 {
        up_from_gravity(self.gravity).unwrap_or(Vec3::Y)
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Force applied to the body each step.
    pub fn force(&self) -> Vec3 {
        self.gravity * self.mass
    }

    pub fn can_jump(&self) -> bool {
        self.can_jump
    }

    pub fn jump_velocity(&self) -> f32 {
        self.jump_velocity
    }

    /// Whether a gravity change would be accepted at `now`.
    pub fn cooldown_ready(&self, now: f64) -> bool {
        self.last_change.map_or(true, |last| now - last >= self.cooldown)
    }

    /// Change gravity, rotating the body so its up follows the new gravity.
    ///
    /// Rejected while the cooldown from the last accepted change is running,
    /// and for zero or non-finite vectors. The new vector is stored as given,
    /// magnitude included.
    pub fn set_gravity(
        &mut self,
        physics: &mut PhysicsWorld,
        body: BodyId,
        gravity: Vec3,
        now: f64,
    ) -> bool {
        if !is_valid_gravity(gravity) {
            warn!(?gravity, "rejected invalid gravity");
            return false;
        }
        if !self.cooldown_ready(now) {
            debug!(?body, now, "gravity change on cooldown");
            return false;
        }

        let old_up = self.up();
        let new_up = up_from_gravity(gravity).unwrap_or(Vec3::Y);
        let arc = Quat::from_rotation_arc(old_up, new_up);
        if let Some(rotation) = physics.rotation(body) {
            physics.set_rotation(body, (arc * rotation).normalize());
        }

        self.gravity = gravity;
        self.last_change = Some(now);
        debug!(?body, ?gravity, "gravity changed");
        true
    }

    /// Replace gravity without cooldown or reorientation.
    ///
    /// Used by fields that recompute gravity continuously.
    pub fn steer_gravity(&mut self, gravity: Vec3) -> bool {
        if !is_valid_gravity(gravity) {
            return false;
        }
        self.gravity = gravity;
        true
    }

    /// Jump along local up if grounded.
    ///
    /// Any velocity along up is replaced by exactly the jump velocity, so
    /// residual fall speed never adds to or cancels the jump.
    pub fn jump(&mut self, physics: &mut PhysicsWorld, body: BodyId, now: f64) -> bool {
        if !self.can_jump {
            return false;
        }
        let Some(velocity) = physics.linvel(body) else {
            return false;
        };

        let up = self.up();
        let lateral = velocity - up * velocity.dot(up);
        physics.set_linvel(body, lateral + up * self.jump_velocity);
        physics.set_linear_damping(body, self.jump_damping);

        self.can_jump = false;
        self.damping_until = Some(now + self.jump_damping_duration);
        true
    }

    /// Record a contact with `other`. `normal` points from `other` into this
    /// body. Returns whether the contact counts as ground.
    pub fn touch_ground(&mut self, other: Entity, normal: Vec3) -> bool {
        if !is_ground_normal(self.up(), normal, self.ground_threshold) {
            return false;
        }
        self.ground.insert(other);
        self.can_jump = true;
        true
    }

    /// Forget a contact with `other`. Jumping is disabled once no ground
    /// contact remains.
    pub fn leave_ground(&mut self, other: Entity) {
        if self.ground.remove(&other) && self.ground.is_empty() {
            self.can_jump = false;
        }
    }

    /// Whether the body currently stands on `other`.
    pub fn is_on(&self, other: Entity) -> bool {
        self.ground.contains(&other)
    }

    /// Restore normal damping once the post-jump window has passed.
    pub fn update_damping(&mut self, physics: &mut PhysicsWorld, body: BodyId, now: f64) {
        if self.damping_until.is_some_and(|until| now >= until) {
            physics.set_linear_damping(body, self.base_damping);
            self.damping_until = None;
        }
    }
}

/// Push every gravity body with its own gravity for the next step.
pub fn apply_gravity_forces(world: &mut hecs::World, physics: &mut PhysicsWorld) {
    for (_, (gravity, body)) in world.query_mut::<(&GravityBody, &PhysicsBody)>() {
        physics.reset_forces(body.0);
        physics.add_force(body.0, gravity.force());
    }
}

/// Restore damping on bodies whose jump window has ended.
pub fn update_damping(world: &mut hecs::World, physics: &mut PhysicsWorld, now: f64) {
    for (_, (gravity, body)) in world.query_mut::<(&mut GravityBody, &PhysicsBody)>() {
        gravity.update_damping(physics, body.0, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::physics::{BodyDesc, ShapeDesc};
    use approx::assert_relative_eq;

    fn player_body(physics: &mut PhysicsWorld) -> BodyId {
        physics
            .add_body(
                &BodyDesc::dynamic(1.0)
                    .position(Vec3::new(0.0, 5.0, 0.0))
                    .lock_rotations(true)
                    .collider(ShapeDesc::cuboid(0.5, 0.5, 0.5)),
            )
            .unwrap()
    }

    fn ground_entity() -> Entity {
        hecs::World::new().spawn(())
    }

    #[test]
    fn test_rejects_invalid_initial_gravity() {
        let config = PlayerConfig::default().gravity(Vec3::ZERO);
        assert!(matches!(
            GravityBody::new(&config),
            Err(FlipsideError::InvalidGravity(_))
        ));
    }

    #[test]
    fn test_force_is_mass_times_gravity() {
        let gravity = GravityBody::new(&PlayerConfig::default().mass(2.0)).unwrap();
        assert_eq!(gravity.force(), Vec3::new(0.0, -19.64, 0.0));
        assert_eq!(gravity.up(), Vec3::Y);
    }

    #[test]
    fn test_gravity_cooldown() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let mut gravity = GravityBody::new(&PlayerConfig::default()).unwrap();

        assert!(gravity.set_gravity(&mut physics, body, Vec3::new(9.82, 0.0, 0.0), 1.0));
        assert!(
            !gravity.set_gravity(&mut physics, body, Vec3::new(0.0, 9.82, 0.0), 1.3),
            "second change inside the window is ignored"
        );
        assert_eq!(gravity.gravity(), Vec3::new(9.82, 0.0, 0.0));

        assert!(gravity.set_gravity(&mut physics, body, Vec3::new(0.0, 9.82, 0.0), 1.6));
        assert_eq!(gravity.gravity(), Vec3::new(0.0, 9.82, 0.0));
    }

    #[test]
    fn test_gravity_change_rotates_body_by_minimal_arc() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let start = Quat::from_rotation_y(0.7);
        physics.set_rotation(body, start);
        let mut gravity = GravityBody::new(&PlayerConfig::default()).unwrap();

        let new = Vec3::new(0.0, 0.0, 3.0);
        assert!(gravity.set_gravity(&mut physics, body, new, 0.0));

        let rotation = physics.rotation(body).unwrap();
        let up_marker = rotation * Vec3::Y;
        assert!((up_marker - Vec3::NEG_Z).length() < 1e-4, "up marker at {up_marker}");

        let expected = Quat::from_rotation_arc(Vec3::Y, Vec3::NEG_Z) * start;
        assert!(rotation.dot(expected).abs() > 1.0 - 1e-5);
        assert_eq!(gravity.gravity(), new, "magnitude is kept verbatim");
    }

    #[test]
    fn test_gravity_flip_handles_opposite_direction() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let mut gravity = GravityBody::new(&PlayerConfig::default()).unwrap();

        assert!(gravity.set_gravity(&mut physics, body, Vec3::new(0.0, 9.82, 0.0), 0.0));
        let rotation = physics.rotation(body).unwrap();
        assert!(rotation.is_finite());
        assert!((rotation * Vec3::Y - Vec3::NEG_Y).length() < 1e-4);
    }

    #[test]
    fn test_invalid_gravity_does_not_start_cooldown() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let mut gravity = GravityBody::new(&PlayerConfig::default()).unwrap();

        assert!(!gravity.set_gravity(&mut physics, body, Vec3::ZERO, 0.0));
        assert!(!gravity.set_gravity(&mut physics, body, Vec3::splat(f32::NAN), 0.0));
        assert!(gravity.cooldown_ready(0.0));
        assert!(!gravity.steer_gravity(Vec3::ZERO));
    }

    #[test]
    fn test_jump_replaces_up_velocity() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let mut gravity = GravityBody::new(&PlayerConfig::default()).unwrap();

        assert!(!gravity.jump(&mut physics, body, 0.0), "cannot jump in the air");

        gravity.touch_ground(ground_entity(), Vec3::Y);
        physics.set_linvel(body, Vec3::new(1.0, -4.0, 0.5));
        assert!(gravity.jump(&mut physics, body, 0.0));

        let v = physics.linvel(body).unwrap();
        assert_relative_eq!(v.y, 7.5, epsilon = 1e-5);
        assert_relative_eq!(v.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(v.z, 0.5, epsilon = 1e-5);
        assert!(!gravity.can_jump());
        assert!(!gravity.jump(&mut physics, body, 0.0));
    }

    #[test]
    fn test_jump_follows_sideways_gravity() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let config = PlayerConfig::default().gravity(Vec3::new(-9.82, 0.0, 0.0));
        let mut gravity = GravityBody::new(&config).unwrap();

        gravity.touch_ground(ground_entity(), Vec3::X);
        physics.set_linvel(body, Vec3::new(-3.0, 0.0, 0.0));
        assert!(gravity.jump(&mut physics, body, 0.0));
        let v = physics.linvel(body).unwrap();
        assert!((v - Vec3::new(7.5, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_jump_damping_window() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let config = PlayerConfig::default().jump_damping(0.6, 0.35);
        let mut gravity = GravityBody::new(&config).unwrap();

        gravity.touch_ground(ground_entity(), Vec3::Y);
        gravity.jump(&mut physics, body, 1.0);
        assert_eq!(physics.linear_damping(body), Some(0.6));

        gravity.update_damping(&mut physics, body, 1.2);
        assert_eq!(physics.linear_damping(body), Some(0.6));
        gravity.update_damping(&mut physics, body, 1.4);
        assert_eq!(physics.linear_damping(body), Some(config.linear_damping));
    }

    #[test]
    fn test_ground_contacts() {
        let mut world = hecs::World::new();
        let floor = world.spawn(());
        let wall = world.spawn(());
        let mut gravity = GravityBody::new(&PlayerConfig::default()).unwrap();

        assert!(!gravity.touch_ground(wall, Vec3::X));
        assert!(!gravity.can_jump());
        assert!(gravity.touch_ground(floor, Vec3::Y));
        assert!(gravity.can_jump());

        gravity.leave_ground(wall);
        assert!(gravity.can_jump(), "leaving a wall keeps the ground");
        gravity.leave_ground(floor);
        assert!(!gravity.can_jump());
    }

    #[test]
    fn test_stale_ground_survives_gravity_flip() {
        let mut physics = PhysicsWorld::default();
        let body = player_body(&mut physics);
        let floor = ground_entity();
        let mut gravity = GravityBody::new(&PlayerConfig::default()).unwrap();

        gravity.touch_ground(floor, Vec3::Y);
        gravity.set_gravity(&mut physics, body, Vec3::new(0.0, 9.82, 0.0), 0.0);
        assert!(gravity.can_jump());
        assert!(gravity.is_on(floor));
    }

    #[test]
    fn test_apply_gravity_forces_system() {
        let mut physics = PhysicsWorld::default();
        let body = physics
            .add_body(
                &BodyDesc::dynamic(2.0)
                    .lock_rotations(true)
                    .collider(ShapeDesc::cuboid(0.5, 0.5, 0.5)),
            )
            .unwrap();
        let mut world = hecs::World::new();
        let config = PlayerConfig::default().mass(2.0).gravity(Vec3::new(0.0, 0.0, 9.82));
        world.spawn((GravityBody::new(&config).unwrap(), PhysicsBody(body)));

        apply_gravity_forces(&mut world, &mut physics);
        physics.step();
        let dt = physics.timestep();
        let v = physics.linvel(body).unwrap();
        assert_relative_eq!(v.z, 9.82 * dt, epsilon = 1e-3);

        apply_gravity_forces(&mut world, &mut physics);
        physics.step();
        let v = physics.linvel(body).unwrap();
        assert_relative_eq!(v.z, 2.0 * 9.82 * dt, epsilon = 1e-3);
    }
}

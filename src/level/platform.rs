//! Kinematic platforms that glide toward a target once started.

use glam::Vec3;
use tracing::debug;

use crate::ecs::components::physics::PhysicsBody;
use crate::physics::PhysicsWorld;

/// Fraction of the remaining distance covered per tick.
pub const DEFAULT_RATE: f32 = 0.01;

/// Platform movement state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingPlatform {
    pub start: Vec3,
    /// Target point; a platform without one never moves.
    pub end: Option<Vec3>,
    pub rate: f32,
    moving: bool,
}

impl MovingPlatform {
    pub fn new(start: Vec3, end: Option<Vec3>) -> Self {
        Self {
            start,
            end,
            rate: DEFAULT_RATE,
            moving: false,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Begin moving toward `end`. Starting twice is harmless.
    pub fn start(&mut self) {
        if self.end.is_some() && !self.moving {
            debug!(start = ?self.start, end = ?self.end, "platform started");
            self.moving = true;
        }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Position for the next tick given the current one.
    pub fn next_position(&self, current: Vec3) -> Vec3 {
        match self.end {
            Some(end) if self.moving => current.lerp(end, self.rate),
            _ => current,
        }
    }
}

/// Set next-step targets for every moving platform.
pub fn update_platforms(world: &mut hecs::World, physics: &mut PhysicsWorld) {
    for (_, (platform, body)) in world.query_mut::<(&MovingPlatform, &PhysicsBody)>() {
        if !platform.is_moving() {
            continue;
        }
        if let Some(current) = physics.translation(body.0) {
            physics.set_next_kinematic_translation(body.0, platform.next_position(current));
        }
    }
}

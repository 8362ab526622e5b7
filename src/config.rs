//! Simulation settings
//!
//! Tunables for the physics step, the players and the follow camera.

use std::f32::consts::PI;

use glam::Vec3;

/// Settings for the rigid-body world.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Fixed timestep in seconds. Default: 1/45.
    pub fixed_timestep: f32,
    /// Maximum continuous collision detection substeps. Default: 1.
    pub max_ccd_substeps: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 45.0,
            max_ccd_substeps: 1,
        }
    }
}

impl PhysicsConfig {
    /// Create physics settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fixed timestep.
    pub fn fixed_timestep(mut self, fixed_timestep: f32) -> Self {
        self.fixed_timestep = fixed_timestep;
        self
    }

    /// Set the maximum number of CCD substeps.
    pub fn max_ccd_substeps(mut self, max_ccd_substeps: usize) -> Self {
        self.max_ccd_substeps = max_ccd_substeps;
        self
    }
}

/// Settings shared by every player body.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Body mass in kilograms.
    pub mass: f32,
    /// Half extent of the player's box collider.
    pub half_extent: f32,
    /// Horizontal speed while a movement key is held.
    pub walk_speed: f32,
    /// Velocity along local up right after a jump.
    pub jump_velocity: f32,
    /// Initial gravity. Direction is "down" for the player.
    pub gravity: Vec3,
    /// Minimum seconds between two accepted gravity changes.
    pub gravity_cooldown: f64,
    /// Minimum dot product between local up and a contact normal for the
    /// contact to count as ground.
    pub ground_threshold: f32,
    /// Linear damping in normal play.
    pub linear_damping: f32,
    /// Linear damping right after a jump.
    pub jump_damping: f32,
    /// Seconds the jump damping stays in effect.
    pub jump_damping_duration: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            half_extent: 0.5,
            walk_speed: 5.0,
            jump_velocity: 7.5,
            gravity: Vec3::new(0.0, -9.82, 0.0),
            gravity_cooldown: 0.5,
            ground_threshold: 0.5,
            linear_damping: 0.01,
            jump_damping: 0.6,
            jump_damping_duration: 0.35,
        }
    }
}

impl PlayerConfig {
    /// Create player settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body mass.
    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set the half extent of the box collider.
    pub fn half_extent(mut self, half_extent: f32) -> Self {
        self.half_extent = half_extent;
        self
    }

    /// Set the walking speed.
    pub fn walk_speed(mut self, walk_speed: f32) -> Self {
        self.walk_speed = walk_speed;
        self
    }

    /// Set the jump velocity.
    pub fn jump_velocity(mut self, jump_velocity: f32) -> Self {
        self.jump_velocity = jump_velocity;
        self
    }

    /// Set the initial gravity vector.
    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the gravity change cooldown in seconds.
    pub fn gravity_cooldown(mut self, gravity_cooldown: f64) -> Self {
        self.gravity_cooldown = gravity_cooldown;
        self
    }

    /// Set the grounding threshold.
    pub fn ground_threshold(mut self, ground_threshold: f32) -> Self {
        self.ground_threshold = ground_threshold;
        self
    }

    /// Set the base linear damping.
    pub fn linear_damping(mut self, linear_damping: f32) -> Self {
        self.linear_damping = linear_damping;
        self
    }

    /// Set the damping applied after a jump and how long it lasts.
    pub fn jump_damping(mut self, jump_damping: f32, duration: f64) -> Self {
        self.jump_damping = jump_damping;
        self.jump_damping_duration = duration;
        self
    }
}

/// Settings for the follow camera.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Orbit distance from the player.
    pub radius: f32,
    /// Fraction of the remaining angle covered per tick.
    pub smoothing: f32,
    /// Radians per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Lower pitch bound (polar angle from local up).
    pub min_pitch: f32,
    /// Upper pitch bound.
    pub max_pitch: f32,
    /// Yaw a player starts with.
    pub initial_yaw: f32,
    /// Pitch a player starts with.
    pub initial_pitch: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: 6.0,
            smoothing: 0.2,
            mouse_sensitivity: 0.002,
            min_pitch: 0.1,
            max_pitch: PI - 0.1,
            initial_yaw: 0.0,
            initial_pitch: PI / 3.0,
        }
    }
}

impl CameraConfig {
    /// Create camera settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the orbit radius.
    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Set the smoothing factor.
    pub fn smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing.clamp(0.0, 1.0);
        self
    }

    /// Set the mouse sensitivity.
    pub fn mouse_sensitivity(mut self, mouse_sensitivity: f32) -> Self {
        self.mouse_sensitivity = mouse_sensitivity;
        self
    }

    /// Set the pitch bounds.
    pub fn pitch_bounds(mut self, min_pitch: f32, max_pitch: f32) -> Self {
        self.min_pitch = min_pitch;
        self.max_pitch = max_pitch;
        self
    }
}

/// All settings needed to build and run a level.
#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub camera: CameraConfig,
}

impl GameConfig {
    /// Create game settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the physics settings.
    pub fn physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Set the player settings.
    pub fn player(mut self, player: PlayerConfig) -> Self {
        self.player = player;
        self
    }

    /// Set the camera settings.
    pub fn camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert!((config.physics.fixed_timestep - 1.0 / 45.0).abs() < 1e-9);
        assert_eq!(config.player.jump_velocity, 7.5);
        assert_eq!(config.player.gravity, Vec3::new(0.0, -9.82, 0.0));
        assert_eq!(config.player.gravity_cooldown, 0.5);
        assert_eq!(config.camera.mouse_sensitivity, 0.002);
    }

    #[test]
    fn test_builder_setters() {
        let config = GameConfig::new()
            .player(PlayerConfig::new().walk_speed(3.0).gravity(Vec3::X))
            .camera(CameraConfig::new().radius(10.0).smoothing(4.0));
        assert_eq!(config.player.walk_speed, 3.0);
        assert_eq!(config.player.gravity, Vec3::X);
        assert_eq!(config.camera.radius, 10.0);
        assert_eq!(config.camera.smoothing, 1.0, "smoothing is clamped to [0, 1]");
    }
}

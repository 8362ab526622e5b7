//! Level composition and the per-tick driver.
//!
//! A [`Level`] owns everything one scene needs: entities, the physics world,
//! the body registry, trigger regions and the follow camera. A level restart
//! builds a fresh `Level` instead of resetting one in place.
//!
//! # Tick order
//!
//! 1. Debug keys (switch player, flip gravity)
//! 2. Mouse look for the active player
//! 3. Gravity fields, platform targets and object hooks
//! 4. Movement and jump for the active player
//! 5. Gravity forces and damping timers
//! 6. Physics step
//! 7. Contact classification
//! 8. Camera and active player orientation
//! 9. Transform hand-off
//! 10. Win condition poll

pub mod builder;
pub mod catalog;
pub mod platform;
pub mod update;

use glam::Vec3;
use hecs::Entity;
use tracing::{debug, info};

use crate::camera::{input_velocity, CameraPose, FollowCamera, FollowTarget};
use crate::config::GameConfig;
use crate::ecs::components::physics::{ColliderDesc, PhysicsBody};
use crate::ecs::components::player::{CameraAngle, PlayerSlot};
use crate::ecs::systems::sync_transforms;
use crate::error::{FlipsideError, Result};
use crate::gravity::{apply_gravity_fields, apply_gravity_forces, update_damping, GravityBody};
use crate::input::{Bindings, InputState};
use crate::physics::{BodyId, EntityRegistry, PhysicsWorld};
use crate::trigger::{ContactClassifier, TriggerContext};

pub use builder::{LevelBuilder, LevelObjectDesc, PlatformDesc, TriggerDesc};
pub use platform::{update_platforms, MovingPlatform};
pub use update::{run_object_updates, ObjectUpdate};

/// Gameplay state of one level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelState {
    /// Whether each player stands on its landing pad.
    pub on_pad: [bool; 2],
    /// Player receiving movement input.
    pub active: PlayerSlot,
    /// Simulated seconds since the level started.
    pub time: f64,
    pub ticks: u64,
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            on_pad: [false; 2],
            active: PlayerSlot::One,
            time: 0.0,
            ticks: 0,
        }
    }
}

impl LevelState {
    /// The win condition: both players on their pads at once.
    pub fn both_on_pads(&self) -> bool {
        self.on_pad.iter().all(|&on| on)
    }
}

/// What the host should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// Both players reached their pads; load the next level.
    Advance,
}

/// A running level.
pub struct Level {
    world: hecs::World,
    physics: PhysicsWorld,
    registry: EntityRegistry,
    classifier: ContactClassifier,
    camera: FollowCamera,
    config: GameConfig,
    bindings: Bindings,
    state: LevelState,
    players: [Entity; 2],
}

impl Level {
    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &ContactClassifier {
        &self.classifier
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn set_bindings(&mut self, bindings: Bindings) {
        self.bindings = bindings;
    }

    /// Camera pose from the last tick.
    pub fn camera_pose(&self) -> CameraPose {
        self.camera.pose()
    }

    pub fn player(&self, slot: PlayerSlot) -> Entity {
        self.players[slot.index()]
    }

    pub fn active_player(&self) -> Entity {
        self.player(self.state.active)
    }

    pub fn player_body(&self, slot: PlayerSlot) -> Option<BodyId> {
        self.registry.body_of(self.player(slot))
    }

    pub fn player_position(&self, slot: PlayerSlot) -> Option<Vec3> {
        self.player_body(slot)
            .and_then(|body| self.physics.translation(body))
    }

    pub fn gravity(&self, slot: PlayerSlot) -> Option<Vec3> {
        self.world
            .get::<&GravityBody>(self.player(slot))
            .ok()
            .map(|g| g.gravity())
    }

    pub fn can_jump(&self, slot: PlayerSlot) -> bool {
        self.world
            .get::<&GravityBody>(self.player(slot))
            .is_ok_and(|g| g.can_jump())
    }

    /// Whether the entity's body is in the world.
    pub fn has_body(&self, entity: Entity) -> bool {
        self.world
            .get::<&PhysicsBody>(entity)
            .is_ok_and(|b| self.physics.contains(b.0))
    }

    /// Hand control to the other player.
    pub fn switch_player(&mut self) {
        self.state.active = self.state.active.other();
        info!(active = ?self.state.active, "switched player");
    }

    /// Change a player's gravity, subject to its cooldown.
    pub fn set_gravity(&mut self, slot: PlayerSlot, gravity: Vec3) -> bool {
        let entity = self.player(slot);
        let Some(body) = self.registry.body_of(entity) else {
            return false;
        };
        let Ok(mut gravity_body) = self.world.get::<&mut GravityBody>(entity) else {
            return false;
        };
        gravity_body.set_gravity(&mut self.physics, body, gravity, self.state.time)
    }

    /// Make a player jump if it stands on something.
    pub fn jump(&mut self, slot: PlayerSlot) -> bool {
        let entity = self.player(slot);
        let Some(body) = self.registry.body_of(entity) else {
            return false;
        };
        let Ok(mut gravity_body) = self.world.get::<&mut GravityBody>(entity) else {
            return false;
        };
        gravity_body.jump(&mut self.physics, body, self.state.time)
    }

    /// Append shapes to an entity's body once its geometry is available.
    pub fn attach_shapes(&mut self, entity: Entity, shapes: &[ColliderDesc]) -> Result<()> {
        let body = self
            .registry
            .body_of(entity)
            .ok_or(FlipsideError::MissingBody(entity))?;
        for shape in shapes {
            self.physics.add_collider(body, shape)?;
        }
        debug!(?entity, count = shapes.len(), "attached shapes");
        Ok(())
    }

    /// Remove a non-player entity with its body and trigger state.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if self.players.contains(&entity) {
            debug!(?entity, "players cannot be despawned");
            return false;
        }
        if let Some(body) = self.registry.unregister_entity(entity) {
            self.physics.remove_body(body);
        }
        let now = self.state.time;
        let mut ctx = TriggerContext {
            world: &mut self.world,
            physics: &mut self.physics,
            state: &mut self.state,
            now,
        };
        self.classifier.forget(entity, &mut ctx);
        self.world.despawn(entity).is_ok()
    }

    /// Advance the level by one fixed timestep.
    ///
    /// Per-frame key edges in `input` are consumed.
    pub fn tick(&mut self, input: &mut InputState) -> TickOutcome {
        let now = self.state.time;

        if input.just_pressed(self.bindings.switch_player) {
            self.switch_player();
        }
        if input.just_pressed(self.bindings.flip_gravity) {
            let slot = self.state.active;
            if let Some(gravity) = self.gravity(slot) {
                self.set_gravity(slot, -gravity);
            }
        }

        self.mouse_look(input);
        apply_gravity_fields(&mut self.world, &self.physics);
        update_platforms(&mut self.world, &mut self.physics);
        run_object_updates(&mut self.world, &mut self.physics, now);
        self.drive_active_player(input, now);

        apply_gravity_forces(&mut self.world, &mut self.physics);
        update_damping(&mut self.world, &mut self.physics, now);

        let events = self.physics.step();
        self.state.ticks += 1;
        self.state.time += f64::from(self.physics.timestep());

        let now = self.state.time;
        let mut ctx = TriggerContext {
            world: &mut self.world,
            physics: &mut self.physics,
            state: &mut self.state,
            now,
        };
        self.classifier.process(&events, &self.registry, &mut ctx);

        self.follow_active_player();
        sync_transforms(&mut self.world, &self.physics);
        input.end_frame();

        if self.state.both_on_pads() {
            info!(ticks = self.state.ticks, "both players on their pads");
            TickOutcome::Advance
        } else {
            TickOutcome::Continue
        }
    }

    fn mouse_look(&mut self, input: &mut InputState) {
        let (dx, dy) = input.take_mouse_delta();
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let camera = &self.config.camera;
        if let Ok(mut angle) = self.world.get::<&mut CameraAngle>(self.active_player()) {
            angle.rotate(
                dx,
                dy,
                camera.mouse_sensitivity,
                camera.min_pitch,
                camera.max_pitch,
            );
        }
    }

    /// Replace the active player's lateral velocity with the input direction,
    /// stopping it when no key is held, then jump if asked to.
    fn drive_active_player(&mut self, input: &InputState, now: f64) {
        let entity = self.active_player();
        let Some(body) = self.registry.body_of(entity) else {
            return;
        };
        let Ok(mut gravity) = self.world.get::<&mut GravityBody>(entity) else {
            return;
        };

        if let (Some(velocity), Some(rotation)) =
            (self.physics.linvel(body), self.physics.rotation(body))
        {
            let up = gravity.up();
            let along_up = up * velocity.dot(up);
            let movement = input.movement(&self.bindings);
            let walk = if movement.is_idle() {
                Vec3::ZERO
            } else {
                input_velocity(rotation, movement, self.config.player.walk_speed)
            };
            self.physics.set_linvel(body, along_up + walk);
        }

        if input.is_pressed(self.bindings.jump) {
            gravity.jump(&mut self.physics, body, now);
        }
    }

    fn follow_active_player(&mut self) {
        let entity = self.active_player();
        let Some(body) = self.registry.body_of(entity) else {
            return;
        };
        let Some(position) = self.physics.translation(body) else {
            return;
        };
        let gravity = self.world.get::<&GravityBody>(entity).map(|g| g.gravity());
        let angle = self.world.get::<&CameraAngle>(entity).map(|a| *a);
        let (Ok(gravity), Ok(angle)) = (gravity, angle) else {
            return;
        };

        self.camera.update(&FollowTarget {
            position,
            gravity,
            angle,
        });
        let facing = FollowCamera::body_orientation(gravity, self.camera.angle().yaw);
        self.physics.set_rotation(body, facing);
    }

    pub(crate) fn from_parts(parts: LevelParts) -> Self {
        let LevelParts {
            world,
            physics,
            registry,
            classifier,
            config,
            players,
            active,
        } = parts;

        let mut camera = FollowCamera::new(&config.camera);
        let active_entity = players[active.index()];
        if let Ok(angle) = world.get::<&CameraAngle>(active_entity) {
            camera.snap(*angle);
        }

        let mut level = Self {
            world,
            physics,
            registry,
            classifier,
            camera,
            config,
            bindings: Bindings::default(),
            state: LevelState {
                active,
                ..LevelState::default()
            },
            players,
        };
        level.follow_active_player();
        sync_transforms(&mut level.world, &level.physics);
        level
    }
}

/// Everything a [`LevelBuilder`] hands over to a new [`Level`].
pub(crate) struct LevelParts {
    pub world: hecs::World,
    pub physics: PhysicsWorld,
    pub registry: EntityRegistry,
    pub classifier: ContactClassifier,
    pub config: GameConfig,
    pub players: [Entity; 2],
    pub active: PlayerSlot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::physics::ShapeDesc;
    use crate::input::{Event, Key};

    fn flat_level() -> Level {
        let mut builder = LevelBuilder::new(GameConfig::default());
        builder
            .spawn_object(
                LevelObjectDesc::new("ground")
                    .fixed()
                    .offset(Vec3::new(0.0, -0.5, 0.0))
                    .shape(ShapeDesc::cuboid(20.0, 0.5, 20.0)),
            )
            .unwrap();
        builder
            .spawn_player(PlayerSlot::One, Vec3::new(-3.0, 0.5, 0.0), None)
            .unwrap();
        builder
            .spawn_player(PlayerSlot::Two, Vec3::new(3.0, 0.5, 0.0), None)
            .unwrap();
        builder.build().unwrap()
    }

    fn settle(level: &mut Level, input: &mut InputState) {
        for _ in 0..30 {
            level.tick(input);
        }
    }

    #[test]
    fn test_state_win_condition() {
        let mut state = LevelState::default();
        assert!(!state.both_on_pads());
        state.on_pad[1] = true;
        assert!(!state.both_on_pads());
        state.on_pad[0] = true;
        assert!(state.both_on_pads());
    }

    #[test]
    fn test_tick_advances_time() {
        let mut level = flat_level();
        let mut input = InputState::new();
        assert_eq!(level.tick(&mut input), TickOutcome::Continue);
        assert_eq!(level.state().ticks, 1);
        assert!((level.state().time - 1.0 / 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_switch_key_changes_active_player() {
        let mut level = flat_level();
        let mut input = InputState::new();
        input.handle_events(&[Event::KeyPress { key: Key::X }]);
        level.tick(&mut input);
        assert_eq!(level.state().active, PlayerSlot::Two);

        level.tick(&mut input);
        assert_eq!(level.state().active, PlayerSlot::Two, "holding the key does not toggle again");
    }

    #[test]
    fn test_gravity_key_flips_active_player_only() {
        let mut level = flat_level();
        let mut input = InputState::new();
        input.handle_events(&[Event::KeyPress { key: Key::G }]);
        level.tick(&mut input);
        assert_eq!(level.gravity(PlayerSlot::One), Some(Vec3::new(0.0, 9.82, 0.0)));
        assert_eq!(level.gravity(PlayerSlot::Two), Some(Vec3::new(0.0, -9.82, 0.0)));
    }

    #[test]
    fn test_walking_moves_active_player() {
        let mut level = flat_level();
        let mut input = InputState::new();
        settle(&mut level, &mut input);
        let start = level.player_position(PlayerSlot::One).unwrap();
        let other = level.player_position(PlayerSlot::Two).unwrap();

        input.handle_events(&[Event::KeyPress { key: Key::W }]);
        settle(&mut level, &mut input);
        let moved = level.player_position(PlayerSlot::One).unwrap();
        assert!(start.distance(moved) > 1.0, "active player walked");
        assert!((moved.y - start.y).abs() < 0.1, "walking stays on the floor");

        let still = level.player_position(PlayerSlot::Two).unwrap();
        assert!(other.distance(still) < 0.05, "inactive player ignores keys");
    }

    #[test]
    fn test_releasing_keys_stops_player() {
        let mut level = flat_level();
        let mut input = InputState::new();
        settle(&mut level, &mut input);

        input.handle_events(&[Event::KeyPress { key: Key::W }]);
        for _ in 0..20 {
            level.tick(&mut input);
        }
        input.handle_events(&[Event::KeyRelease { key: Key::W }]);
        level.tick(&mut input);

        let body = level.player_body(PlayerSlot::One).unwrap();
        let velocity = level.physics().linvel(body).unwrap();
        assert!(
            Vec3::new(velocity.x, 0.0, velocity.z).length() < 1e-3,
            "lateral velocity dropped, got {velocity}"
        );

        let stopped = level.player_position(PlayerSlot::One).unwrap();
        for _ in 0..90 {
            level.tick(&mut input);
        }
        let later = level.player_position(PlayerSlot::One).unwrap();
        assert!(stopped.distance(later) < 0.05, "no glide after release");
    }

    #[test]
    fn test_mouse_look_turns_camera_and_body() {
        let mut level = flat_level();
        let mut input = InputState::new();
        input.handle_events(&[Event::MouseMotion {
            delta: (-500.0, 0.0),
        }]);
        settle(&mut level, &mut input);

        let angle = *level
            .world()
            .get::<&CameraAngle>(level.player(PlayerSlot::One))
            .unwrap();
        assert!((angle.yaw - 1.0).abs() < 1e-5);

        let body = level.player_body(PlayerSlot::One).unwrap();
        let facing = level.physics().vector_to_world(body, Vec3::X).unwrap();
        let forward = level.camera_pose().forward();
        let forward = Vec3::new(forward.x, 0.0, forward.z).normalize();
        assert!(facing.dot(forward) > 0.99, "player faces away from the camera");
    }

    #[test]
    fn test_attach_and_despawn() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        builder
            .spawn_player(PlayerSlot::One, Vec3::ZERO, None)
            .unwrap();
        builder
            .spawn_player(PlayerSlot::Two, Vec3::X * 3.0, None)
            .unwrap();
        let crate_entity = builder
            .spawn_object(LevelObjectDesc::new("crate").offset(Vec3::new(0.0, 4.0, 5.0)))
            .unwrap();
        let mut level = builder.build().unwrap();

        let shape = ColliderDesc::new(ShapeDesc::cuboid(0.5, 0.5, 0.5));
        level.attach_shapes(crate_entity, &[shape.clone()]).unwrap();
        assert!(level.has_body(crate_entity));

        assert!(!level.despawn(level.player(PlayerSlot::One)));
        assert!(level.despawn(crate_entity));
        assert!(level.registry().body_of(crate_entity).is_none());
        assert!(matches!(
            level.attach_shapes(crate_entity, &[shape]),
            Err(FlipsideError::MissingBody(_))
        ));

        let mut input = InputState::new();
        assert_eq!(level.tick(&mut input), TickOutcome::Continue);
    }
}

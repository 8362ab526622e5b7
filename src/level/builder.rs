//! Declarative level assembly.

use anyhow::{ensure, Context};
use glam::{Quat, Vec3};
use hecs::Entity;

use super::platform::{MovingPlatform, DEFAULT_RATE};
use super::update::ObjectUpdate;
use super::{Level, LevelParts};
use crate::config::GameConfig;
use crate::ecs::components::physics::{
    BodyDesc, BodyKind, ColliderDesc, CollisionGroups, PhysicsBody, ShapeDesc, SurfaceMaterial,
};
use crate::ecs::components::player::{CameraAngle, Name, Player, PlayerSlot};
use crate::ecs::components::transform::Transform;
use crate::error::FlipsideError;
use crate::gravity::{GravityBody, RadialGravity};
use crate::physics::{BodyId, EntityRegistry, PhysicsWorld};
use crate::trigger::{ContactClassifier, TriggerEffect, TriggerFilter, TriggerRegion};

/// Options for one static or dynamic level object.
#[derive(Debug, Clone)]
pub struct LevelObjectDesc {
    pub name: String,
    pub offset: Vec3,
    pub rotation: Quat,
    pub body_type: BodyKind,
    /// Mass of a dynamic object.
    pub mass: f32,
    /// Detect overlaps only.
    pub is_trigger: bool,
    pub group: CollisionGroups,
    pub mask: CollisionGroups,
    /// Collision shapes. Objects whose geometry arrives later start empty
    /// and receive shapes through [`Level::attach_shapes`].
    pub shapes: Vec<ColliderDesc>,
    pub material: SurfaceMaterial,
    /// Start with colliders disabled, to be revealed by a trigger.
    pub hidden: bool,
    /// Own gravity of a dynamic object. The world has none, so a dynamic
    /// object without it floats.
    pub gravity: Option<Vec3>,
}

impl LevelObjectDesc {
    /// A dynamic object of mass 1 at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            body_type: BodyKind::Dynamic,
            mass: 1.0,
            is_trigger: false,
            group: CollisionGroups::OBJECTS,
            mask: CollisionGroups::all(),
            shapes: Vec::new(),
            material: SurfaceMaterial::GROUND,
            hidden: false,
            gravity: None,
        }
    }

    /// Make the object static and part of the scenery.
    pub fn fixed(mut self) -> Self {
        self.body_type = BodyKind::Static;
        self.group = CollisionGroups::SCENE;
        self
    }

    pub fn offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn trigger(mut self, is_trigger: bool) -> Self {
        self.is_trigger = is_trigger;
        self
    }

    pub fn groups(mut self, group: CollisionGroups, mask: CollisionGroups) -> Self {
        self.group = group;
        self.mask = mask;
        self
    }

    pub fn shape(mut self, shape: impl Into<ColliderDesc>) -> Self {
        self.shapes.push(shape.into());
        self
    }

    pub fn material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = Some(gravity);
        self
    }

    /// Body descriptor for the physics world.
    pub fn body_desc(&self) -> BodyDesc {
        let base = match self.body_type {
            BodyKind::Dynamic => BodyDesc::dynamic(self.mass),
            BodyKind::Static => BodyDesc::fixed(),
            BodyKind::Kinematic => BodyDesc::kinematic(),
        };
        BodyDesc {
            position: self.offset,
            rotation: self.rotation,
            colliders: self.shapes.clone(),
            sensor: self.is_trigger,
            group: self.group,
            mask: self.mask,
            material: self.material,
            enabled: !self.hidden,
            ..base
        }
    }
}

/// A kinematic platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformDesc {
    pub start: Vec3,
    pub end: Option<Vec3>,
    pub half_extents: Vec3,
    pub rate: f32,
}

impl PlatformDesc {
    pub fn new(start: Vec3) -> Self {
        Self {
            start,
            end: None,
            half_extents: Vec3::new(2.0, 0.25, 2.0),
            rate: DEFAULT_RATE,
        }
    }

    pub fn end(mut self, end: Vec3) -> Self {
        self.end = Some(end);
        self
    }

    pub fn half_extents(mut self, half_extents: Vec3) -> Self {
        self.half_extents = half_extents;
        self
    }
}

/// Filter and effect of a trigger attached to an existing object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerDesc {
    pub filter: TriggerFilter,
    pub effect: TriggerEffect,
}

impl TriggerDesc {
    pub fn landing_pad(slot: PlayerSlot) -> Self {
        Self {
            filter: TriggerFilter::Player(slot),
            effect: TriggerEffect::LandingPad { slot },
        }
    }

    pub fn gravity_pad(strength: f32) -> Self {
        Self {
            filter: TriggerFilter::AnyPlayer,
            effect: TriggerEffect::GravityPad { strength },
        }
    }

    pub fn invert_gravity() -> Self {
        Self {
            filter: TriggerFilter::AnyPlayer,
            effect: TriggerEffect::InvertGravity,
        }
    }

    /// A button that starts a platform.
    pub fn start_platform(platform: Entity) -> Self {
        Self {
            filter: TriggerFilter::AnyPlayer,
            effect: TriggerEffect::StartPlatform(platform),
        }
    }

    /// A button that reveals a hidden object.
    pub fn reveal(target: Entity) -> Self {
        Self {
            filter: TriggerFilter::AnyPlayer,
            effect: TriggerEffect::Reveal(target),
        }
    }
}

/// Builds a [`Level`] object by object.
pub struct LevelBuilder {
    config: GameConfig,
    world: hecs::World,
    physics: PhysicsWorld,
    registry: EntityRegistry,
    classifier: ContactClassifier,
    players: [Option<Entity>; 2],
    active: PlayerSlot,
}

impl LevelBuilder {
    pub fn new(config: GameConfig) -> Self {
        Self {
            physics: PhysicsWorld::new(config.physics.clone()),
            config,
            world: hecs::World::new(),
            registry: EntityRegistry::new(),
            classifier: ContactClassifier::new(),
            players: [None; 2],
            active: PlayerSlot::One,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Body created for `entity`.
    pub fn body_of(&self, entity: Entity) -> Option<BodyId> {
        self.registry.body_of(entity)
    }

    /// Player controlled when the level starts.
    pub fn active(&mut self, slot: PlayerSlot) -> &mut Self {
        self.active = slot;
        self
    }

    /// Spawn a player. `gravity` overrides the configured default.
    pub fn spawn_player(
        &mut self,
        slot: PlayerSlot,
        position: Vec3,
        gravity: Option<Vec3>,
    ) -> anyhow::Result<Entity> {
        ensure!(
            self.players[slot.index()].is_none(),
            "player {slot:?} spawned twice"
        );

        let mut player = self.config.player.clone();
        if let Some(gravity) = gravity {
            player = player.gravity(gravity);
        }
        let gravity_body = GravityBody::new(&player)
            .with_context(|| format!("invalid gravity for player {slot:?}"))?;
        let rotation = Quat::from_rotation_arc(Vec3::Y, gravity_body.up());

        let h = player.half_extent;
        let desc = BodyDesc::dynamic(player.mass)
            .position(position)
            .rotation(rotation)
            .lock_rotations(true)
            .groups(CollisionGroups::PLAYER, CollisionGroups::all())
            .material(SurfaceMaterial::PLAYER)
            .linear_damping(player.linear_damping)
            .collider(ShapeDesc::cuboid(h, h, h));
        let body = self
            .physics
            .add_body(&desc)
            .with_context(|| format!("creating body for player {slot:?}"))?;

        let camera = &self.config.camera;
        let entity = self.world.spawn((
            Name(format!("player{}", slot.index() + 1)),
            Player { slot },
            PhysicsBody(body),
            gravity_body,
            CameraAngle::new(camera.initial_yaw, camera.initial_pitch),
            Transform::from_pose(position, rotation),
        ));
        self.registry.register(body, entity);
        self.players[slot.index()] = Some(entity);
        Ok(entity)
    }

    /// Spawn a level object.
    pub fn spawn_object(&mut self, desc: LevelObjectDesc) -> anyhow::Result<Entity> {
        let gravity = match desc.gravity {
            Some(gravity) => {
                let config = self.config.player.clone().mass(desc.mass).gravity(gravity);
                let body = GravityBody::new(&config)
                    .with_context(|| format!("invalid gravity for {}", desc.name))?;
                Some(body)
            }
            None => None,
        };

        let body = self
            .physics
            .add_body(&desc.body_desc())
            .with_context(|| format!("creating body for {}", desc.name))?;
        let entity = self.world.spawn((
            Name(desc.name),
            PhysicsBody(body),
            Transform::from_pose(desc.offset, desc.rotation),
        ));
        if let Some(gravity) = gravity {
            self.world.insert_one(entity, gravity)?;
        }
        self.registry.register(body, entity);
        Ok(entity)
    }

    /// Run `hook` on an object every tick, before the physics step.
    pub fn on_update(
        &mut self,
        entity: Entity,
        hook: impl FnMut(&mut PhysicsWorld, BodyId, f64) + Send + Sync + 'static,
    ) -> anyhow::Result<()> {
        ensure!(
            self.registry.body_of(entity).is_some(),
            "update hook for an entity without a body"
        );
        self.world.insert_one(entity, ObjectUpdate::new(hook))?;
        Ok(())
    }

    /// Spawn a kinematic platform that moves once started.
    pub fn spawn_platform(
        &mut self,
        name: impl Into<String>,
        platform: PlatformDesc,
    ) -> anyhow::Result<Entity> {
        let name = name.into();
        let h = platform.half_extents;
        let desc = BodyDesc::kinematic()
            .position(platform.start)
            .groups(CollisionGroups::SCENE, CollisionGroups::all())
            .material(SurfaceMaterial::GROUND)
            .collider(ShapeDesc::cuboid(h.x, h.y, h.z));
        let body = self
            .physics
            .add_body(&desc)
            .with_context(|| format!("creating platform {name}"))?;

        let entity = self.world.spawn((
            Name(name),
            PhysicsBody(body),
            MovingPlatform::new(platform.start, platform.end).with_rate(platform.rate),
            Transform::from_position(platform.start),
        ));
        self.registry.register(body, entity);
        Ok(entity)
    }

    /// Attach a trigger to an object spawned earlier.
    pub fn add_trigger(&mut self, entity: Entity, trigger: TriggerDesc) -> anyhow::Result<()> {
        let body = self
            .registry
            .body_of(entity)
            .ok_or(FlipsideError::MissingBody(entity))
            .context("adding trigger")?;
        self.classifier.add_region(
            TriggerRegion::new(entity, body)
                .filter(trigger.filter)
                .effect(trigger.effect),
        );
        Ok(())
    }

    /// Attach a fully configured region, callbacks included.
    pub fn add_region(&mut self, region: TriggerRegion) {
        self.classifier.add_region(region);
    }

    /// Give a player gravity that follows a field.
    pub fn add_gravity_field(
        &mut self,
        slot: PlayerSlot,
        field: RadialGravity,
    ) -> anyhow::Result<()> {
        let entity = self.players[slot.index()]
            .with_context(|| format!("player {slot:?} must be spawned before its field"))?;
        self.world
            .insert_one(entity, field)
            .with_context(|| format!("player {slot:?} was despawned"))?;
        Ok(())
    }

    /// Finish the level. Both players must exist.
    pub fn build(self) -> anyhow::Result<Level> {
        let [Some(one), Some(two)] = self.players else {
            let count = self.players.iter().flatten().count();
            return Err(FlipsideError::PlayerCount(count)).context("building level");
        };
        Ok(Level::from_parts(LevelParts {
            world: self.world,
            physics: self.physics,
            registry: self.registry,
            classifier: self.classifier,
            config: self.config,
            players: [one, two],
            active: self.active,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_desc_maps_to_body() {
        let desc = LevelObjectDesc::new("pad")
            .fixed()
            .trigger(true)
            .hidden(true)
            .offset(Vec3::new(1.0, 2.0, 3.0))
            .shape(ShapeDesc::cuboid(1.0, 0.1, 1.0))
            .body_desc();
        assert_eq!(desc.kind, BodyKind::Static);
        assert!(desc.sensor);
        assert!(!desc.enabled);
        assert_eq!(desc.group, CollisionGroups::SCENE);
        assert_eq!(desc.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(desc.colliders.len(), 1);
    }

    #[test]
    fn test_build_requires_two_players() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        builder
            .spawn_player(PlayerSlot::One, Vec3::ZERO, None)
            .unwrap();
        let err = builder.build().err().unwrap();
        assert!(matches!(
            err.downcast_ref::<FlipsideError>(),
            Some(FlipsideError::PlayerCount(1))
        ));
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        builder
            .spawn_player(PlayerSlot::Two, Vec3::ZERO, None)
            .unwrap();
        assert!(builder
            .spawn_player(PlayerSlot::Two, Vec3::X, None)
            .is_err());
    }

    #[test]
    fn test_invalid_player_gravity() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        assert!(builder
            .spawn_player(PlayerSlot::One, Vec3::ZERO, Some(Vec3::ZERO))
            .is_err());
    }

    #[test]
    fn test_player_starts_upright_under_its_gravity() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        let entity = builder
            .spawn_player(PlayerSlot::One, Vec3::ZERO, Some(Vec3::new(0.0, 9.82, 0.0)))
            .unwrap();
        let body = builder.body_of(entity).unwrap();
        let up = builder.physics.vector_to_world(body, Vec3::Y).unwrap();
        assert!((up - Vec3::NEG_Y).length() < 1e-4);
    }

    #[test]
    fn test_object_gravity_is_optional() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        let floating = builder
            .spawn_object(LevelObjectDesc::new("balloon").shape(ShapeDesc::cuboid(0.5, 0.5, 0.5)))
            .unwrap();
        let heavy = builder
            .spawn_object(
                LevelObjectDesc::new("cube")
                    .mass(2.0)
                    .gravity(Vec3::new(0.0, -9.82, 0.0))
                    .shape(ShapeDesc::cuboid(0.5, 0.5, 0.5)),
            )
            .unwrap();
        assert!(builder.world.get::<&GravityBody>(floating).is_err());
        let gravity = builder.world.get::<&GravityBody>(heavy).unwrap();
        assert_eq!(gravity.force(), Vec3::new(0.0, -19.64, 0.0));
        drop(gravity);

        let bodies = builder.physics.len();
        assert!(builder
            .spawn_object(LevelObjectDesc::new("bad").gravity(Vec3::ZERO))
            .is_err());
        assert_eq!(builder.physics.len(), bodies, "rejected object adds no body");
    }

    #[test]
    fn test_update_hook_needs_body() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        let stray = builder.world.spawn(());
        assert!(builder.on_update(stray, |_, _, _| {}).is_err());
    }

    #[test]
    fn test_trigger_needs_spawned_object() {
        let mut builder = LevelBuilder::new(GameConfig::default());
        let stray = builder.world.spawn(());
        assert!(builder
            .add_trigger(stray, TriggerDesc::landing_pad(PlayerSlot::One))
            .is_err());
        assert!(builder
            .add_gravity_field(PlayerSlot::One, RadialGravity::new(Vec3::ZERO, 9.81))
            .is_err());
    }
}

//! Trigger regions: a body plus a filter, a built-in effect and optional
//! enter/exit callbacks.

use std::collections::HashSet;
use std::fmt;

use glam::Vec3;
use hecs::Entity;
use tracing::{debug, info};

use super::TriggerContext;
use crate::ecs::components::physics::PhysicsBody;
use crate::ecs::components::player::{Player, PlayerSlot};
use crate::gravity::GravityBody;
use crate::level::platform::MovingPlatform;
use crate::physics::BodyId;

/// Callback run once per enter or exit edge.
pub type TriggerCallback = Box<dyn FnMut(&mut TriggerContext<'_>, &TriggerHit)>;

/// One side of a region transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerHit {
    pub region: Entity,
    pub other: Entity,
    pub other_body: BodyId,
    /// Normal pointing from the region into `other`, for solid contacts.
    pub normal: Option<Vec3>,
}

/// Which entities a region reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerFilter {
    Any,
    AnyPlayer,
    Player(PlayerSlot),
    Entity(Entity),
}

impl TriggerFilter {
    pub fn accepts(&self, world: &hecs::World, entity: Entity) -> bool {
        match self {
            TriggerFilter::Any => true,
            TriggerFilter::AnyPlayer => world.get::<&Player>(entity).is_ok(),
            TriggerFilter::Player(slot) => world
                .get::<&Player>(entity)
                .is_ok_and(|player| player.slot == *slot),
            TriggerFilter::Entity(e) => *e == entity,
        }
    }
}

/// Gameplay effect applied when something enters or leaves a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEffect {
    /// Flag only; callbacks do the work.
    None,
    /// Tracks the player's on-pad flag.
    LandingPad { slot: PlayerSlot },
    /// Points the entering body's gravity along the region's up.
    GravityPad { strength: f32 },
    /// Reverses the entering body's gravity.
    InvertGravity,
    /// Starts a moving platform.
    StartPlatform(Entity),
    /// Enables the colliders of a hidden object.
    Reveal(Entity),
}

/// A region tracked by the [`ContactClassifier`](super::ContactClassifier).
pub struct TriggerRegion {
    entity: Entity,
    body: BodyId,
    filter: TriggerFilter,
    effect: TriggerEffect,
    touching: HashSet<Entity>,
    on_enter: Option<TriggerCallback>,
    on_exit: Option<TriggerCallback>,
}

impl fmt::Debug for TriggerRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRegion")
            .field("entity", &self.entity)
            .field("body", &self.body)
            .field("filter", &self.filter)
            .field("effect", &self.effect)
            .field("touching", &self.touching)
            .finish_non_exhaustive()
    }
}

impl TriggerRegion {
    /// A region reacting to anything, with no effect.
    pub fn new(entity: Entity, body: BodyId) -> Self {
        Self {
            entity,
            body,
            filter: TriggerFilter::Any,
            effect: TriggerEffect::None,
            touching: HashSet::new(),
            on_enter: None,
            on_exit: None,
        }
    }

    /// A landing pad for one player.
    pub fn landing_pad(entity: Entity, body: BodyId, slot: PlayerSlot) -> Self {
        Self::new(entity, body)
            .filter(TriggerFilter::Player(slot))
            .effect(TriggerEffect::LandingPad { slot })
    }

    /// A pad that sets gravity along its own up.
    pub fn gravity_pad(entity: Entity, body: BodyId, strength: f32) -> Self {
        Self::new(entity, body)
            .filter(TriggerFilter::AnyPlayer)
            .effect(TriggerEffect::GravityPad { strength })
    }

    pub fn filter(mut self, filter: TriggerFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn effect(mut self, effect: TriggerEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn on_enter(
        mut self,
        callback: impl FnMut(&mut TriggerContext<'_>, &TriggerHit) + 'static,
    ) -> Self {
        self.on_enter = Some(Box::new(callback));
        self
    }

    pub fn on_exit(
        mut self,
        callback: impl FnMut(&mut TriggerContext<'_>, &TriggerHit) + 'static,
    ) -> Self {
        self.on_exit = Some(Box::new(callback));
        self
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn trigger_effect(&self) -> TriggerEffect {
        self.effect
    }

    /// Whether anything accepted by the filter is inside.
    pub fn is_active(&self) -> bool {
        !self.touching.is_empty()
    }

    pub fn is_touching(&self, entity: Entity) -> bool {
        self.touching.contains(&entity)
    }

    /// Handle a begin contact. Returns whether this was a new enter edge.
    pub(crate) fn begin(&mut self, ctx: &mut TriggerContext<'_>, hit: &TriggerHit) -> bool {
        if !self.filter.accepts(ctx.world, hit.other) || !self.touching.insert(hit.other) {
            return false;
        }
        debug!(region = ?self.entity, other = ?hit.other, "enter");
        self.apply_enter(ctx, hit);
        if let Some(callback) = self.on_enter.as_mut() {
            callback(ctx, hit);
        }
        true
    }

    /// Handle an end contact. Returns whether this was an exit edge.
    pub(crate) fn end(&mut self, ctx: &mut TriggerContext<'_>, hit: &TriggerHit) -> bool {
        if !self.touching.remove(&hit.other) {
            return false;
        }
        debug!(region = ?self.entity, other = ?hit.other, "exit");
        self.apply_exit(ctx);
        if let Some(callback) = self.on_exit.as_mut() {
            callback(ctx, hit);
        }
        true
    }

    fn apply_enter(&self, ctx: &mut TriggerContext<'_>, hit: &TriggerHit) {
        match self.effect {
            TriggerEffect::None => {}
            TriggerEffect::LandingPad { slot } => {
                ctx.state.on_pad[slot.index()] = true;
                info!(?slot, "player on pad");
            }
            TriggerEffect::GravityPad { strength } => {
                let Some(up) = ctx.physics.vector_to_world(self.body, Vec3::Y) else {
                    return;
                };
                if let Ok(mut gravity) = ctx.world.get::<&mut GravityBody>(hit.other) {
                    gravity.set_gravity(ctx.physics, hit.other_body, up * strength, ctx.now);
                }
            }
            TriggerEffect::InvertGravity => {
                if let Ok(mut gravity) = ctx.world.get::<&mut GravityBody>(hit.other) {
                    let inverted = -gravity.gravity();
                    gravity.set_gravity(ctx.physics, hit.other_body, inverted, ctx.now);
                }
            }
            TriggerEffect::StartPlatform(entity) => {
                if let Ok(mut platform) = ctx.world.get::<&mut MovingPlatform>(entity) {
                    platform.start();
                }
            }
            TriggerEffect::Reveal(target) => {
                let body = ctx.world.get::<&PhysicsBody>(target).map(|b| b.0);
                if let Ok(body) = body {
                    ctx.physics.set_enabled(body, true);
                    debug!(?target, "revealed");
                }
            }
        }
    }

    fn apply_exit(&self, ctx: &mut TriggerContext<'_>) {
        if let TriggerEffect::LandingPad { slot } = self.effect {
            ctx.state.on_pad[slot.index()] = self.is_active();
        }
    }

    /// Empty the region before it is removed. Only the on-pad flag is
    /// updated; callbacks do not run.
    pub(crate) fn release(&mut self, ctx: &mut TriggerContext<'_>) {
        if !self.touching.is_empty() {
            self.touching.clear();
            self.apply_exit(ctx);
        }
    }

    /// Drop a despawned entity from the touching set. Only the on-pad flag is
    /// updated; callbacks do not run.
    pub(crate) fn forget(&mut self, ctx: &mut TriggerContext<'_>, entity: Entity) {
        if self.touching.remove(&entity) {
            self.apply_exit(ctx);
        }
    }
}

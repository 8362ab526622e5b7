//! Contact classification.
//!
//! Turns body-pair contact events into gameplay state: ground contacts for
//! bodies with their own gravity, and enter/exit edges for trigger regions.
//! Participants are always matched by body identity; the physics engine
//! gives no guarantee which side of a pair a body is reported on.

pub mod grounding;
pub mod region;

use hecs::Entity;
use tracing::debug;

use crate::gravity::GravityBody;
use crate::level::LevelState;
use crate::physics::{ContactEvent, EntityRegistry, PhysicsWorld};

pub use region::{TriggerCallback, TriggerEffect, TriggerFilter, TriggerHit, TriggerRegion};

/// Mutable state a trigger may touch.
pub struct TriggerContext<'a> {
    pub world: &'a mut hecs::World,
    pub physics: &'a mut PhysicsWorld,
    pub state: &'a mut LevelState,
    /// Level time in seconds.
    pub now: f64,
}

/// Routes contact events to ground tracking and trigger regions.
#[derive(Debug, Default)]
pub struct ContactClassifier {
    regions: Vec<TriggerRegion>,
}

impl ContactClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, region: TriggerRegion) {
        self.regions.push(region);
    }

    pub fn regions(&self) -> &[TriggerRegion] {
        &self.regions
    }

    /// The first region owned by `entity`.
    pub fn region(&self, entity: Entity) -> Option<&TriggerRegion> {
        self.regions.iter().find(|r| r.entity() == entity)
    }

    /// Classify one step's events.
    ///
    /// Events whose bodies do not resolve to entities are skipped without
    /// side effects.
    pub fn process(
        &mut self,
        events: &[ContactEvent],
        registry: &EntityRegistry,
        ctx: &mut TriggerContext<'_>,
    ) {
        for event in events {
            let contact = event.contact();
            let (Some(a), Some(b)) = (
                registry.resolve(contact.body_a),
                registry.resolve(contact.body_b),
            ) else {
                debug!(?event, "contact with unregistered body");
                continue;
            };

            grounding::update_ground(ctx.world, event, a, b);

            for region in &mut self.regions {
                let hit = if contact.body_a == region.body() {
                    TriggerHit {
                        region: region.entity(),
                        other: b,
                        other_body: contact.body_b,
                        normal: contact.normal,
                    }
                } else if contact.body_b == region.body() {
                    TriggerHit {
                        region: region.entity(),
                        other: a,
                        other_body: contact.body_a,
                        normal: contact.normal.map(|n| -n),
                    }
                } else {
                    continue;
                };

                if event.is_begin() {
                    region.begin(ctx, &hit);
                } else {
                    region.end(ctx, &hit);
                }
            }
        }
    }

    /// Drop every trace of a despawned entity: its regions, its presence in
    /// other regions and in ground contacts.
    pub fn forget(&mut self, entity: Entity, ctx: &mut TriggerContext<'_>) {
        for region in &mut self.regions {
            if region.entity() == entity {
                region.release(ctx);
            } else {
                region.forget(ctx, entity);
            }
        }
        self.regions.retain(|r| r.entity() != entity);
        for (_, gravity) in ctx.world.query_mut::<&mut GravityBody>() {
            gravity.leave_ground(entity);
        }
    }
}

//! Rigid-body world with per-body gravity.
//!
//! # Architecture
//!
//! Dynamics are delegated to rapier. This module wraps it with:
//!
//! 1. Zero world gravity (each player pushes itself with its own gravity force)
//! 2. One fixed-timestep step per call
//! 3. Body-pair contact events, reduced from collider events
//! 4. Synchronous dispatch of those events to registered listeners
//!
//! Positions, rotations and vectors cross the boundary as glam types.

mod body;
pub mod contact;
pub mod registry;

use std::cmp::Ordering;
use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::prelude::{
    CCDSolver, ColliderHandle, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Real,
    RigidBody, RigidBodyHandle, RigidBodySet, Vector,
};
use tracing::{debug, trace};

use crate::config::PhysicsConfig;
use crate::ecs::components::physics::{BodyDesc, ColliderDesc};
use crate::error::{FlipsideError, Result};
use crate::math::{quat_from_na, quat_to_na, vec_from_na, vec_to_na};

use self::body::{build_body, build_collider, collider_mass, ColliderTemplate};
use self::contact::{ContactCollector, PairTracker};

pub use self::contact::{Contact, ContactEvent, ContactKind};
pub use self::registry::EntityRegistry;

/// Stable identity of a body in a [`PhysicsWorld`].
///
/// Wraps the engine's generational handle, so a recycled slot never compares
/// equal to the body that used it before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(RigidBodyHandle);

impl BodyId {
    /// Build an id from an index and generation.
    pub fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self(RigidBodyHandle::from_raw_parts(index, generation))
    }

    /// Index and generation of this id.
    pub fn into_raw_parts(self) -> (u32, u32) {
        self.0.into_raw_parts()
    }

    pub fn handle(self) -> RigidBodyHandle {
        self.0
    }
}

impl PartialOrd for BodyId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BodyId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.into_raw_parts().cmp(&other.into_raw_parts())
    }
}

/// Handle returned by [`PhysicsWorld::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    kind: ContactKind,
    callback: Box<dyn FnMut(&ContactEvent)>,
}

/// The main physics world.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: ContactCollector,
    pairs: PairTracker,
    owners: HashMap<ColliderHandle, BodyId>,
    templates: HashMap<BodyId, ColliderTemplate>,
    pending: Vec<ContactEvent>,
    listeners: Vec<Listener>,
    next_listener: u64,
    steps: u64,
}

impl PhysicsWorld {
    /// Create an empty world. Built-in gravity is always zero.
    pub fn new(config: PhysicsConfig) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: config.fixed_timestep,
            max_ccd_substeps: config.max_ccd_substeps,
            ..IntegrationParameters::default()
        };

        Self {
            config,
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: ContactCollector::default(),
            pairs: PairTracker::default(),
            owners: HashMap::new(),
            templates: HashMap::new(),
            pending: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            steps: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Seconds advanced by one [`step`](Self::step).
    pub fn timestep(&self) -> f32 {
        self.config.fixed_timestep
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of bodies in the world.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.contains(body.0)
    }

    /// Create a body and its colliders.
    pub fn add_body(&mut self, desc: &BodyDesc) -> Result<BodyId> {
        desc.validate()?;
        let template = ColliderTemplate::from(desc);
        let mass = collider_mass(desc);

        // Build every collider before inserting anything so a bad shape
        // leaves the world untouched.
        let colliders = desc
            .colliders
            .iter()
            .map(|c| build_collider(c, &template, mass))
            .collect::<Result<Vec<_>>>()?;

        let id = BodyId(self.bodies.insert(build_body(desc)));
        for collider in colliders {
            let handle = self
                .colliders
                .insert_with_parent(collider, id.0, &mut self.bodies);
            self.owners.insert(handle, id);
        }
        self.templates.insert(id, template);

        debug!(body = ?id, kind = ?desc.kind, shapes = desc.colliders.len(), "added body");
        Ok(id)
    }

    /// Append a shape to an existing body without changing its mass.
    pub fn add_collider(&mut self, body: BodyId, collider: &ColliderDesc) -> Result<()> {
        let template = *self
            .templates
            .get(&body)
            .ok_or(FlipsideError::UnknownBody(body))?;
        let collider = build_collider(collider, &template, None)?;
        let handle = self
            .colliders
            .insert_with_parent(collider, body.0, &mut self.bodies);
        self.owners.insert(handle, body);
        trace!(?body, "appended collider");
        Ok(())
    }

    /// Remove a body with its colliders.
    ///
    /// Pairs the body was part of end immediately; the matching
    /// [`ContactEvent::End`] events are delivered by the next step.
    pub fn remove_body(&mut self, body: BodyId) -> bool {
        let Some(handles) = self.body(body).map(|rb| rb.colliders().to_vec()) else {
            return false;
        };
        self.bodies.remove(
            body.0,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );

        for handle in &handles {
            self.owners.remove(handle);
        }
        self.templates.remove(&body);
        self.pending.extend(self.pairs.remove_body(body));
        debug!(?body, "removed body");
        true
    }

    /// Enable or disable every collider of a body.
    pub fn set_enabled(&mut self, body: BodyId, enabled: bool) {
        let Some(rb) = self.bodies.get(body.0) else {
            return;
        };
        for handle in rb.colliders() {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                collider.set_enabled(enabled);
            }
        }
        if let Some(template) = self.templates.get_mut(&body) {
            template.enabled = enabled;
        }
    }

    /// Whether the body's colliders take part in the simulation.
    pub fn is_enabled(&self, body: BodyId) -> bool {
        self.templates.get(&body).is_some_and(|t| t.enabled)
    }

    /// Register a listener called synchronously from [`step`](Self::step).
    pub fn on(
        &mut self,
        kind: ContactKind,
        callback: impl FnMut(&ContactEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    /// Unregister a listener.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Advance the world by one fixed timestep.
    ///
    /// Returns the body-pair contact events of this step, after they have been
    /// dispatched to listeners.
    pub fn step(&mut self) -> Vec<ContactEvent> {
        self.pipeline.step(
            &Vector::<Real>::zeros(),
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.collector,
        );
        self.steps += 1;

        let mut events = std::mem::take(&mut self.pending);
        for raw in self.collector.drain() {
            // Colliders of removed bodies are no longer owned; their stop
            // events were already emitted by `remove_body`.
            let (Some(a), Some(b)) = (
                self.owners.get(&raw.collider1).copied(),
                self.owners.get(&raw.collider2).copied(),
            ) else {
                continue;
            };
            if let Some(event) = self.pairs.process(a, b, &raw) {
                events.push(event);
            }
        }

        for event in &events {
            trace!(step = self.steps, ?event, "contact");
            for listener in &mut self.listeners {
                if listener.kind.matches(event) {
                    (listener.callback)(event);
                }
            }
        }
        events
    }

    /// Whether two bodies currently touch.
    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        self.pairs.is_touching(a, b)
    }

    fn body(&self, body: BodyId) -> Option<&RigidBody> {
        self.bodies.get(body.0)
    }

    fn body_mut(&mut self, body: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(body.0)
    }

    pub fn translation(&self, body: BodyId) -> Option<Vec3> {
        self.body(body).map(|rb| vec_from_na(rb.translation()))
    }

    pub fn rotation(&self, body: BodyId) -> Option<Quat> {
        self.body(body).map(|rb| quat_from_na(rb.rotation()))
    }

    pub fn linvel(&self, body: BodyId) -> Option<Vec3> {
        self.body(body).map(|rb| vec_from_na(rb.linvel()))
    }

    pub fn linear_damping(&self, body: BodyId) -> Option<f32> {
        self.body(body).map(|rb| rb.linear_damping())
    }

    /// Rotate a body-local direction into world space.
    pub fn vector_to_world(&self, body: BodyId, local: Vec3) -> Option<Vec3> {
        self.rotation(body).map(|q| q * local)
    }

    pub fn set_translation(&mut self, body: BodyId, translation: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_translation(vec_to_na(translation), true);
        }
    }

    pub fn set_rotation(&mut self, body: BodyId, rotation: Quat) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_rotation(quat_to_na(rotation), true);
        }
    }

    pub fn set_linvel(&mut self, body: BodyId, velocity: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_linvel(vec_to_na(velocity), true);
        }
    }

    pub fn set_linear_damping(&mut self, body: BodyId, damping: f32) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_linear_damping(damping);
        }
    }

    /// Add a force applied during the next step.
    pub fn add_force(&mut self, body: BodyId, force: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.add_force(vec_to_na(force), true);
        }
    }

    /// Clear forces accumulated for the next step.
    pub fn reset_forces(&mut self, body: BodyId) {
        if let Some(rb) = self.body_mut(body) {
            rb.reset_forces(true);
        }
    }

    /// Target position of a kinematic body for the next step.
    pub fn set_next_kinematic_translation(&mut self, body: BodyId, translation: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_next_kinematic_translation(vec_to_na(translation));
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

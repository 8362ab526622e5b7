//! Contact events and body-level pair tracking.
//!
//! The engine reports contacts per collider pair. Gameplay cares about body
//! pairs, so collider events are reference counted per body pair: a body pair
//! begins touching when its first collider pair does and stops when its last
//! one does.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use glam::Vec3;
use rapier3d::prelude::{
    ColliderHandle, ColliderSet, CollisionEvent, ContactPair, EventHandler, Real, RigidBodySet,
};
use tracing::trace;

use super::BodyId;
use crate::math::vec_from_na;

/// Two bodies touching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// World-space normal pointing from `body_a` toward `body_b`. `None` for
    /// sensor overlaps and for end events.
    pub normal: Option<Vec3>,
    /// World-space point of deepest penetration, when known.
    pub point: Option<Vec3>,
    /// At least one side is a trigger volume.
    pub sensor: bool,
}

impl Contact {
    /// Whether `body` is one of the two participants.
    pub fn involves(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// The participant that is not `body`, or `None` if `body` is not part of
    /// this contact.
    pub fn other(&self, body: BodyId) -> Option<BodyId> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }

    /// The contact normal pointing into `body`, away from the other
    /// participant.
    pub fn normal_toward(&self, body: BodyId) -> Option<Vec3> {
        let n = self.normal?;
        if self.body_b == body {
            Some(n)
        } else if self.body_a == body {
            Some(-n)
        } else {
            None
        }
    }

    /// The same contact with the participants swapped.
    pub fn swapped(&self) -> Self {
        Self {
            body_a: self.body_b,
            body_b: self.body_a,
            normal: self.normal.map(|n| -n),
            ..*self
        }
    }
}

/// A body pair starting or stopping contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    Begin(Contact),
    End(Contact),
}

impl ContactEvent {
    pub fn contact(&self) -> &Contact {
        match self {
            ContactEvent::Begin(c) | ContactEvent::End(c) => c,
        }
    }

    pub fn is_begin(&self) -> bool {
        matches!(self, ContactEvent::Begin(_))
    }
}

/// Which events a listener receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Every event.
    Collide,
    Begin,
    End,
}

impl ContactKind {
    pub fn matches(self, event: &ContactEvent) -> bool {
        match self {
            ContactKind::Collide => true,
            ContactKind::Begin => event.is_begin(),
            ContactKind::End => !event.is_begin(),
        }
    }
}

/// One collider-level event as reported by the engine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawContact {
    pub started: bool,
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    pub sensor: bool,
    pub normal: Option<Vec3>,
    pub point: Option<Vec3>,
}

/// Collects collider events during a step.
///
/// The engine may call the handler from several threads, hence the mutex.
#[derive(Default)]
pub(crate) struct ContactCollector {
    raw: Mutex<Vec<RawContact>>,
}

impl ContactCollector {
    pub fn drain(&self) -> Vec<RawContact> {
        let mut raw = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *raw)
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        let (collider1, collider2) = (event.collider1(), event.collider2());
        let (normal, point) = match contact_pair {
            Some(pair) if event.started() => deepest_contact(colliders, pair, collider1),
            _ => (None, None),
        };

        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RawContact {
                started: event.started(),
                collider1,
                collider2,
                sensor: event.sensor(),
                normal,
                point,
            });
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// World-space normal (pointing away from `first`) and deepest point of a
/// contact pair.
fn deepest_contact(
    colliders: &ColliderSet,
    pair: &ContactPair,
    first: ColliderHandle,
) -> (Option<Vec3>, Option<Vec3>) {
    let Some(collider1) = colliders.get(pair.collider1) else {
        return (None, None);
    };
    let pose = collider1.position();

    let (normal, point) = match pair.find_deepest_contact() {
        Some((manifold, contact)) => (
            pose * manifold.local_n1,
            Some(vec_from_na(&(pose * contact.local_p1).coords)),
        ),
        None => match pair.manifolds.first() {
            Some(manifold) => (pose * manifold.local_n1, None),
            None => return (None, None),
        },
    };

    let normal = vec_from_na(&normal).try_normalize();
    let normal = if pair.collider1 == first {
        normal
    } else {
        normal.map(|n| -n)
    };
    (normal, point)
}

#[derive(Debug, Clone, Copy)]
struct PairState {
    body_a: BodyId,
    body_b: BodyId,
    colliders: usize,
    sensor: bool,
}

/// Reduces collider events to body-pair events.
#[derive(Debug, Default)]
pub(crate) struct PairTracker {
    pairs: HashMap<(BodyId, BodyId), PairState>,
}

fn pair_key(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl PairTracker {
    /// Feed one collider-level event with resolved bodies.
    pub fn process(&mut self, a: BodyId, b: BodyId, raw: &RawContact) -> Option<ContactEvent> {
        if a == b {
            return None;
        }
        let key = pair_key(a, b);

        if raw.started {
            let state = self.pairs.entry(key).or_insert(PairState {
                body_a: a,
                body_b: b,
                colliders: 0,
                sensor: raw.sensor,
            });
            state.colliders += 1;
            if state.colliders > 1 {
                trace!(?a, ?b, count = state.colliders, "additional collider pair");
                return None;
            }
            return Some(ContactEvent::Begin(Contact {
                body_a: a,
                body_b: b,
                normal: raw.normal,
                point: raw.point,
                sensor: raw.sensor,
            }));
        }

        let state = self.pairs.get_mut(&key)?;
        state.colliders = state.colliders.saturating_sub(1);
        if state.colliders > 0 {
            return None;
        }
        let state = self.pairs.remove(&key)?;
        Some(ContactEvent::End(Contact {
            body_a: state.body_a,
            body_b: state.body_b,
            normal: None,
            point: None,
            sensor: state.sensor,
        }))
    }

    /// Close every open pair involving `body`.
    pub fn remove_body(&mut self, body: BodyId) -> Vec<ContactEvent> {
        let keys: Vec<_> = self
            .pairs
            .keys()
            .filter(|(a, b)| *a == body || *b == body)
            .copied()
            .collect();

        keys.into_iter()
            .filter_map(|key| self.pairs.remove(&key))
            .map(|state| {
                ContactEvent::End(Contact {
                    body_a: state.body_a,
                    body_b: state.body_b,
                    normal: None,
                    point: None,
                    sensor: state.sensor,
                })
            })
            .collect()
    }

    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        self.pairs.contains_key(&pair_key(a, b))
    }
}

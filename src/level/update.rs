//! Per-object update hooks.

use std::fmt;

use crate::ecs::components::physics::PhysicsBody;
use crate::physics::{BodyId, PhysicsWorld};

type UpdateFn = Box<dyn FnMut(&mut PhysicsWorld, BodyId, f64) + Send + Sync>;

/// Code run on an object's body once per tick, with the level time.
pub struct ObjectUpdate(UpdateFn);

impl ObjectUpdate {
    pub fn new(hook: impl FnMut(&mut PhysicsWorld, BodyId, f64) + Send + Sync + 'static) -> Self {
        Self(Box::new(hook))
    }
}

impl fmt::Debug for ObjectUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUpdate").finish_non_exhaustive()
    }
}

/// Run every object's hook.
pub fn run_object_updates(world: &mut hecs::World, physics: &mut PhysicsWorld, now: f64) {
    for (_, (update, body)) in world.query_mut::<(&mut ObjectUpdate, &PhysicsBody)>() {
        (update.0)(physics, body.0, now);
    }
}

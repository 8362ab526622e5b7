//! Body to entity ownership map.

use std::collections::HashMap;

use hecs::Entity;

use super::BodyId;

/// Bidirectional map between bodies and the entities that own them.
///
/// Contact events only carry body identities; this turns them back into
/// game entities.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    owners: HashMap<BodyId, Entity>,
    bodies: HashMap<Entity, BodyId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `entity` owns `body`. Last write wins for both sides.
    pub fn register(&mut self, body: BodyId, entity: Entity) {
        if let Some(previous) = self.owners.insert(body, entity) {
            if previous != entity {
                self.bodies.remove(&previous);
            }
        }
        if let Some(previous) = self.bodies.insert(entity, body) {
            if previous != body {
                self.owners.remove(&previous);
            }
        }
    }

    /// The entity owning `body`, if any.
    pub fn resolve(&self, body: BodyId) -> Option<Entity> {
        self.owners.get(&body).copied()
    }

    /// The body owned by `entity`, if any.
    pub fn body_of(&self, entity: Entity) -> Option<BodyId> {
        self.bodies.get(&entity).copied()
    }

    /// Forget an entity and its body.
    pub fn unregister_entity(&mut self, entity: Entity) -> Option<BodyId> {
        let body = self.bodies.remove(&entity)?;
        self.owners.remove(&body);
        Some(body)
    }

    /// Forget a body and its owner.
    pub fn unregister_body(&mut self, body: BodyId) -> Option<Entity> {
        let entity = self.owners.remove(&body)?;
        self.bodies.remove(&entity);
        Some(entity)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = hecs::World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    #[test]
    fn test_register_and_resolve() {
        let e = entities(1)[0];
        let body = BodyId::from_raw_parts(3, 1);
        let mut registry = EntityRegistry::new();
        registry.register(body, e);

        assert_eq!(registry.resolve(body), Some(e));
        assert_eq!(registry.body_of(e), Some(body));
        assert_eq!(registry.resolve(BodyId::from_raw_parts(3, 2)), None, "generation differs");
    }

    #[test]
    fn test_last_write_wins() {
        let es = entities(2);
        let body = BodyId::from_raw_parts(0, 0);
        let mut registry = EntityRegistry::new();
        registry.register(body, es[0]);
        registry.register(body, es[1]);

        assert_eq!(registry.resolve(body), Some(es[1]));
        assert_eq!(registry.body_of(es[0]), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let e = entities(1)[0];
        let body = BodyId::from_raw_parts(0, 0);
        let mut registry = EntityRegistry::new();
        registry.register(body, e);

        assert_eq!(registry.unregister_entity(e), Some(body));
        assert!(registry.is_empty());
        assert_eq!(registry.resolve(body), None);
        assert_eq!(registry.unregister_body(body), None);
    }
}

//! Ground detection for bodies with their own gravity.

use glam::Vec3;
use hecs::Entity;

use crate::gravity::GravityBody;
use crate::physics::ContactEvent;

/// Whether a contact normal counts as ground.
///
/// `normal` points from the touched surface into the body; `up` is the
/// body's unit up. With the default threshold of 0.5 this accepts surfaces
/// tilted less than 60 degrees from the body's up.
pub fn is_ground_normal(up: Vec3, normal: Vec3, threshold: f32) -> bool {
    up.dot(normal.normalize_or_zero()) > threshold
}

/// Update ground contacts of both participants of a contact.
///
/// Only entities with a [`GravityBody`] are affected. The contact may report
/// either participant first, so the normal is oriented by comparing body
/// identities.
pub fn update_ground(world: &hecs::World, event: &ContactEvent, a: Entity, b: Entity) {
    let contact = event.contact();
    for (me, my_body, other) in [(a, contact.body_a, b), (b, contact.body_b, a)] {
        let Ok(mut gravity) = world.get::<&mut GravityBody>(me) else {
            continue;
        };
        match event {
            ContactEvent::Begin(c) if !c.sensor => {
                if let Some(normal) = c.normal_toward(my_body) {
                    gravity.touch_ground(other, normal);
                }
            }
            ContactEvent::Begin(_) => {}
            ContactEvent::End(_) => gravity.leave_ground(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::physics::{BodyId, Contact};

    fn tilted(degrees: f32) -> Vec3 {
        let r = degrees.to_radians();
        Vec3::new(r.sin(), r.cos(), 0.0)
    }

    #[test]
    fn test_threshold_angles() {
        let up = Vec3::Y;
        assert!(is_ground_normal(up, tilted(0.0), 0.5));
        assert!(is_ground_normal(up, tilted(45.0), 0.5));
        assert!(is_ground_normal(up, tilted(59.0), 0.5));
        assert!(!is_ground_normal(up, tilted(61.0), 0.5));
        assert!(!is_ground_normal(up, tilted(90.0), 0.5));
    }

    #[test]
    fn test_threshold_follows_gravity() {
        let up = Vec3::NEG_Y;
        assert!(!is_ground_normal(up, Vec3::Y, 0.5), "floor is a ceiling when flipped");
        assert!(is_ground_normal(up, Vec3::NEG_Y, 0.5));
        assert!(!is_ground_normal(up, Vec3::ZERO, 0.5));
    }

    #[test]
    fn test_update_ground_either_order() {
        let player_body = BodyId::from_raw_parts(0, 0);
        let floor_body = BodyId::from_raw_parts(1, 0);
        // Normal from the player into the floor, as reported with the player
        // first.
        let contact = Contact {
            body_a: player_body,
            body_b: floor_body,
            normal: Some(Vec3::NEG_Y),
            point: None,
            sensor: false,
        };

        for contact in [contact, contact.swapped()] {
            let mut world = hecs::World::new();
            let player = world.spawn((GravityBody::new(&PlayerConfig::default()).unwrap(),));
            let floor = world.spawn(());
            let (a, b) = if contact.body_a == player_body {
                (player, floor)
            } else {
                (floor, player)
            };

            update_ground(&world, &ContactEvent::Begin(contact), a, b);
            assert!(world.get::<&GravityBody>(player).unwrap().can_jump());

            update_ground(&world, &ContactEvent::End(contact), a, b);
            assert!(!world.get::<&GravityBody>(player).unwrap().can_jump());
        }
    }

    #[test]
    fn test_sensor_contacts_do_not_ground() {
        let mut world = hecs::World::new();
        let player = world.spawn((GravityBody::new(&PlayerConfig::default()).unwrap(),));
        let pad = world.spawn(());
        let contact = Contact {
            body_a: BodyId::from_raw_parts(1, 0),
            body_b: BodyId::from_raw_parts(0, 0),
            normal: Some(Vec3::Y),
            point: None,
            sensor: true,
        };
        update_ground(&world, &ContactEvent::Begin(contact), pad, player);
        assert!(!world.get::<&GravityBody>(player).unwrap().can_jump());
    }
}

//! Sample levels, in play order.

use anyhow::{bail, Context};
use glam::{Quat, Vec3};

use super::builder::{LevelBuilder, LevelObjectDesc, PlatformDesc, TriggerDesc};
use super::Level;
use crate::config::GameConfig;
use crate::ecs::components::physics::{CollisionGroups, ShapeDesc};
use crate::ecs::components::player::PlayerSlot;
use crate::gravity::RadialGravity;

/// Gravity strength of pads and fields.
pub const STANDARD_GRAVITY: f32 = 9.82;

/// Names of the levels returned by [`load`], by index.
pub const LEVELS: &[&str] = &["landing_pads", "gravity_pad", "planet"];

/// Build level `index`.
pub fn load(index: usize, config: &GameConfig) -> anyhow::Result<Level> {
    let level = match index {
        0 => landing_pads(config),
        1 => gravity_pad(config),
        2 => planet(config),
        _ => bail!("no level {index}, there are {}", LEVELS.len()),
    };
    level.with_context(|| format!("loading level {}", LEVELS[index]))
}

fn ground(builder: &mut LevelBuilder, half_size: f32) -> anyhow::Result<()> {
    builder.spawn_object(
        LevelObjectDesc::new("ground")
            .fixed()
            .offset(Vec3::new(0.0, -0.5, 0.0))
            .shape(ShapeDesc::cuboid(half_size, 0.5, half_size)),
    )?;
    Ok(())
}

fn landing_pad(
    builder: &mut LevelBuilder,
    slot: PlayerSlot,
    position: Vec3,
    rotation: Quat,
) -> anyhow::Result<()> {
    let pad = builder.spawn_object(
        LevelObjectDesc::new(format!("landing_pad{}", slot.index() + 1))
            .fixed()
            .offset(position)
            .rotation(rotation)
            .shape(ShapeDesc::cuboid(1.0, 0.1, 1.0)),
    )?;
    builder.add_trigger(pad, TriggerDesc::landing_pad(slot))
}

/// Flat ground with one pad per player.
pub fn landing_pads(config: &GameConfig) -> anyhow::Result<Level> {
    let mut builder = LevelBuilder::new(config.clone());
    ground(&mut builder, 20.0)?;
    builder.spawn_player(PlayerSlot::One, Vec3::new(-3.0, 0.5, 0.0), None)?;
    builder.spawn_player(PlayerSlot::Two, Vec3::new(3.0, 0.5, 0.0), None)?;
    landing_pad(&mut builder, PlayerSlot::One, Vec3::new(-3.0, 0.1, -8.0), Quat::IDENTITY)?;
    landing_pad(&mut builder, PlayerSlot::Two, Vec3::new(3.0, 0.1, -8.0), Quat::IDENTITY)?;
    builder.build()
}

/// A wall reached through a sideways gravity pad, a platform started by a
/// button, and a hidden inverter revealed by another button.
pub fn gravity_pad(config: &GameConfig) -> anyhow::Result<Level> {
    let mut builder = LevelBuilder::new(config.clone());
    ground(&mut builder, 15.0)?;

    builder.spawn_object(
        LevelObjectDesc::new("wall")
            .fixed()
            .offset(Vec3::new(0.0, 7.5, -15.5))
            .shape(ShapeDesc::cuboid(15.0, 7.5, 0.5)),
    )?;

    builder.spawn_player(PlayerSlot::One, Vec3::new(-5.0, 0.5, 5.0), None)?;
    builder.spawn_player(PlayerSlot::Two, Vec3::new(5.0, 0.5, 5.0), None)?;

    // Pad 1 lies on the wall, facing back into the room.
    let facing_room = Quat::from_rotation_arc(Vec3::Y, Vec3::Z);
    landing_pad(&mut builder, PlayerSlot::One, Vec3::new(-5.0, 6.0, -14.9), facing_room)?;
    landing_pad(&mut builder, PlayerSlot::Two, Vec3::new(10.0, 3.1, 0.0), Quat::IDENTITY)?;

    // Stepping on it makes the wall the floor.
    let pad = builder.spawn_object(
        LevelObjectDesc::new("gravity_pad")
            .fixed()
            .trigger(true)
            .offset(Vec3::new(-5.0, 0.5, -10.0))
            .rotation(Quat::from_rotation_arc(Vec3::Y, Vec3::NEG_Z))
            .shape(ShapeDesc::cuboid(1.0, 0.5, 1.0)),
    )?;
    builder.add_trigger(pad, TriggerDesc::gravity_pad(STANDARD_GRAVITY))?;

    let platform = builder.spawn_platform(
        "plat1",
        PlatformDesc::new(Vec3::new(10.0, -2.0, 0.0)).end(Vec3::new(10.0, 2.75, 0.0)),
    )?;
    let button = builder.spawn_object(
        LevelObjectDesc::new("button")
            .fixed()
            .offset(Vec3::new(8.0, 0.1, 8.0))
            .shape(ShapeDesc::cuboid(0.5, 0.1, 0.5)),
    )?;
    builder.add_trigger(button, TriggerDesc::start_platform(platform))?;

    let inverter = builder.spawn_object(
        LevelObjectDesc::new("inverter")
            .fixed()
            .trigger(true)
            .hidden(true)
            .groups(CollisionGroups::OBJECTS, CollisionGroups::PLAYER)
            .offset(Vec3::new(0.0, 0.5, 10.0))
            .shape(ShapeDesc::cuboid(0.5, 0.5, 0.5)),
    )?;
    builder.add_trigger(inverter, TriggerDesc::invert_gravity())?;

    let reveal = builder.spawn_object(
        LevelObjectDesc::new("button2")
            .fixed()
            .offset(Vec3::new(-8.0, 0.1, 8.0))
            .shape(ShapeDesc::cuboid(0.5, 0.1, 0.5)),
    )?;
    builder.add_trigger(reveal, TriggerDesc::reveal(inverter))?;

    builder.build()
}

/// A small planet whose gravity pulls toward its center.
pub fn planet(config: &GameConfig) -> anyhow::Result<Level> {
    const RADIUS: f32 = 9.0;

    let mut builder = LevelBuilder::new(config.clone());
    builder.spawn_object(
        LevelObjectDesc::new("planet")
            .fixed()
            .groups(CollisionGroups::OBJECTS, CollisionGroups::all())
            .shape(ShapeDesc::Ball { radius: RADIUS }),
    )?;

    for (slot, x) in [(PlayerSlot::One, 3.0), (PlayerSlot::Two, -3.0)] {
        builder.spawn_player(slot, Vec3::new(x, 10.0, 0.0), None)?;
        builder.add_gravity_field(slot, RadialGravity::new(Vec3::ZERO, STANDARD_GRAVITY))?;
    }

    let surface = RADIUS + 0.1;
    for (slot, side) in [(PlayerSlot::One, Vec3::X), (PlayerSlot::Two, Vec3::NEG_X)] {
        let rotation = Quat::from_rotation_arc(Vec3::Y, side);
        landing_pad(&mut builder, slot, side * surface, rotation)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::player::{Name, Player};
    use crate::input::InputState;

    #[test]
    fn test_every_level_loads() {
        let config = GameConfig::default();
        for index in 0..LEVELS.len() {
            let level = load(index, &config).unwrap();
            assert_eq!(
                level.world().query::<&Player>().iter().count(),
                2,
                "{}",
                LEVELS[index]
            );
        }
        assert!(load(LEVELS.len(), &config).is_err());
    }

    #[test]
    fn test_inverter_starts_hidden() {
        let level = gravity_pad(&GameConfig::default()).unwrap();
        let inverter = level
            .world()
            .query::<&Name>()
            .iter()
            .find(|(_, name)| name.0 == "inverter")
            .map(|(entity, _)| entity)
            .unwrap();
        let body = level.registry().body_of(inverter).unwrap();
        assert!(!level.physics().is_enabled(body));
    }

    #[test]
    fn test_planet_pulls_players_to_surface() {
        let mut level = planet(&GameConfig::default()).unwrap();
        let mut input = InputState::new();
        for _ in 0..180 {
            level.tick(&mut input);
        }
        for slot in PlayerSlot::ALL {
            let position = level.player_position(slot).unwrap();
            assert!(
                (position.length() - 9.5).abs() < 0.2,
                "{slot:?} rests on the surface at {position}"
            );
            let gravity = level.gravity(slot).unwrap();
            assert!(gravity.normalize().dot(-position.normalize()) > 0.99);
            assert!(level.can_jump(slot));
        }
    }
}

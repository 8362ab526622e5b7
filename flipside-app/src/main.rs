use flipside::level::catalog;
use flipside::{Event, GameConfig, InputState, Key, Level, PlayerSlot, TickOutcome};

/// Simulated seconds each level gets before the demo moves on.
const LEVEL_TIME_LIMIT: f64 = 30.0;

/// A scripted stand-in for a keyboard and mouse.
struct ScriptedInput {
    steps: Vec<(u64, Event)>,
    cursor: usize,
}

impl ScriptedInput {
    fn new() -> Self {
        let press = |key| Event::KeyPress { key };
        let release = |key| Event::KeyRelease { key };
        Self {
            steps: vec![
                (10, press(Key::W)),
                (40, Event::MouseMotion { delta: (120.0, 0.0) }),
                (60, press(Key::Space)),
                (62, release(Key::Space)),
                (90, release(Key::W)),
                (100, press(Key::X)),
                (101, release(Key::X)),
                (110, press(Key::D)),
                (150, release(Key::D)),
                (160, press(Key::G)),
                (161, release(Key::G)),
            ],
            cursor: 0,
        }
    }

    /// Feed the events scheduled for `tick`, restarting the script once it
    /// runs out.
    fn feed(&mut self, tick: u64, input: &mut InputState) {
        let period = self.steps.last().map_or(1, |(at, _)| at + 40);
        let local = tick % period;
        if local == 0 {
            self.cursor = 0;
        }
        while let Some(&(at, event)) = self.steps.get(self.cursor) {
            if at > local {
                break;
            }
            input.handle_events(&[event]);
            self.cursor += 1;
        }
    }
}

fn report(name: &str, level: &Level) {
    for slot in PlayerSlot::ALL {
        if let (Some(position), Some(gravity)) =
            (level.player_position(slot), level.gravity(slot))
        {
            log::info!(
                "{name}: {slot:?} at {position:.2} gravity {gravity:.2} grounded={}",
                level.can_jump(slot)
            );
        }
    }
}

fn play(index: usize, config: &GameConfig) -> anyhow::Result<bool> {
    let name = catalog::LEVELS[index];
    let mut level = catalog::load(index, config)?;
    let mut input = InputState::new();
    let mut script = ScriptedInput::new();
    log::info!("Starting level {name}");

    while level.state().time < LEVEL_TIME_LIMIT {
        script.feed(level.state().ticks, &mut input);
        if level.tick(&mut input) == TickOutcome::Advance {
            log::info!("{name} cleared after {:.1}s", level.state().time);
            return Ok(true);
        }
        if level.state().ticks % 225 == 0 {
            report(name, &level);
        }
    }

    log::warn!("{name} not cleared within {LEVEL_TIME_LIMIT}s");
    report(name, &level);
    Ok(false)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = GameConfig::default();

    let mut cleared = 0;
    for index in 0..catalog::LEVELS.len() {
        if play(index, &config)? {
            cleared += 1;
        }
    }
    log::info!("{cleared}/{} levels cleared", catalog::LEVELS.len());
    Ok(())
}

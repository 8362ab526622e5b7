//! Input handling
//!
//! Platform-independent keyboard and mouse events, the per-frame key state
//! built from them, and the key bindings of the game.

use std::collections::HashSet;

/// Keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Letters
    A,
    D,
    G,
    S,
    W,
    X,

    // Special keys
    Space,
}

impl Key {
    /// Parse a key name as reported by a host ("w", "Space").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "a" | "A" => Some(Key::A),
            "d" | "D" => Some(Key::D),
            "g" | "G" => Some(Key::G),
            "s" | "S" => Some(Key::S),
            "w" | "W" => Some(Key::W),
            "x" | "X" => Some(Key::X),
            " " | "Space" => Some(Key::Space),
            _ => None,
        }
    }
}

/// Input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Key pressed.
    KeyPress { key: Key },

    /// Key released.
    KeyRelease { key: Key },

    /// Mouse moved by a relative delta in pixels.
    MouseMotion { delta: (f32, f32) },
}

/// Keys the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    pub forward: Key,
    pub back: Key,
    pub left: Key,
    pub right: Key,
    pub jump: Key,
    /// Debug: hand control to the other player.
    pub switch_player: Key,
    /// Debug: reverse the active player's gravity.
    pub flip_gravity: Key,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            forward: Key::W,
            back: Key::S,
            left: Key::A,
            right: Key::D,
            jump: Key::Space,
            switch_player: Key::X,
            flip_gravity: Key::G,
        }
    }
}

/// Movement axes from held keys, each in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    pub forward: f32,
    pub strafe: f32,
}

impl MoveInput {
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.strafe == 0.0
    }
}

/// Held keys, keys pressed this frame and accumulated mouse motion.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
    mouse_delta: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed events received since the last frame.
    pub fn handle_events(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::KeyPress { key } => {
                    if self.held.insert(key) {
                        self.pressed.insert(key);
                    }
                }
                Event::KeyRelease { key } => {
                    self.held.remove(&key);
                }
                Event::MouseMotion { delta } => {
                    self.mouse_delta.0 += delta.0;
                    self.mouse_delta.1 += delta.1;
                }
            }
        }
    }

    /// Whether a key is held.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Whether a key went down this frame. Auto-repeat does not count.
    pub fn just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Take the mouse motion accumulated so far.
    pub fn take_mouse_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.mouse_delta)
    }

    /// Movement axes under `bindings`.
    pub fn movement(&self, bindings: &Bindings) -> MoveInput {
        let axis = |pos: Key, neg: Key| {
            let mut value = 0.0;
            if self.is_pressed(pos) {
                value += 1.0;
            }
            if self.is_pressed(neg) {
                value -= 1.0;
            }
            value
        };
        MoveInput {
            forward: axis(bindings.forward, bindings.back),
            strafe: axis(bindings.right, bindings.left),
        }
    }

    /// Forget per-frame edges. Held keys stay held.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    /// Release every key and drop pending motion.
    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
        self.mouse_delta = (0.0, 0.0);
    }
}

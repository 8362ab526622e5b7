//! Player components.

/// Which of the two players an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::One, PlayerSlot::Two];

    /// Index into per-player arrays.
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    /// The other player.
    pub fn other(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

/// Marks an entity as a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub slot: PlayerSlot,
}

/// Desired camera angles for a player, driven by mouse input.
///
/// `pitch` is the polar angle measured from the player's local up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraAngle {
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraAngle {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Apply a mouse delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32, sensitivity: f32, min_pitch: f32, max_pitch: f32) {
        self.yaw -= dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(min_pitch, max_pitch);
    }
}

/// Debug name of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

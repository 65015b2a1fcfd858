use serde::{Deserialize, Serialize};

pub mod state;

pub use state::{reduce, Action, Player, PlayerSnapshot, Snapshot, Store, WorldState};

pub type PlayerId = u32;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_PLAYERS: usize = 2;
pub const BROADCAST_PERIOD_MS: u64 = 5000;

pub const GRAVITY: f32 = 1200.0;
pub const PLAYER_SPEED: f32 = 200.0;
pub const JUMP_VELOCITY: f32 = -600.0;
pub const BOUNCE_VELOCITY: f32 = -200.0;
pub const WORLD_WIDTH: f32 = 960.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const PLAYER_SIZE: f32 = 32.0;
pub const SPAWN_Y: f32 = 525.0;

/// Coins spent by one swap action.
pub const SWAP_COST: u32 = 3;
pub const KEY_RESPAWN_X: f32 = 903.0;
pub const KEY_RESPAWN_Y: f32 = 105.0;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    PlayerUpdate {
        x: f32,
        y: f32,
        coin_pickup_count: u32,
    },
    KeyPickup,
    KeyReleased,
    SwapAction,
    GameOver {
        score: u32,
    },
    Disconnect,

    Connected {
        client_id: PlayerId,
        spawn_x: f32,
        spawn_y: f32,
    },
    ServerUpdate {
        snapshot: Snapshot,
    },
    PlayerLeft {
        id: PlayerId,
    },
    Disconnected {
        reason: String,
    },
}

/// Axis-aligned box with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box of size `w` x `h` centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    pub fn get_bounds(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x + self.w, self.y + self.h)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Strict overlap test; boxes that only touch along an edge do not overlap.
pub fn check_overlap(a: &Rect, b: &Rect) -> bool {
    let (x1, y1, x2, y2) = a.get_bounds();
    let (x3, y3, x4, y4) = b.get_bounds();

    !(x2 <= x3 || x4 <= x1 || y2 <= y3 || y4 <= y1)
}

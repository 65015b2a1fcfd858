//! Layout of the playable level.

use shared::{Rect, KEY_RESPAWN_X, KEY_RESPAWN_Y, WORLD_HEIGHT, WORLD_WIDTH};

pub const COIN_SIZE: f32 = 22.0;
pub const HOSTILE_WIDTH: f32 = 42.0;
pub const HOSTILE_HEIGHT: f32 = 32.0;
pub const HOSTILE_SPEED: f32 = 100.0;
pub const DOOR_WIDTH: f32 = 42.0;
pub const DOOR_HEIGHT: f32 = 66.0;

const GROUND_TOP: f32 = 546.0;

const PLATFORMS: [(f32, f32, f32, f32); 6] = [
    (208.0, 420.0, 168.0, 42.0),
    (420.0, 336.0, 168.0, 42.0),
    (630.0, 252.0, 168.0, 42.0),
    (840.0, 168.0, 120.0, 42.0),
    (0.0, 252.0, 210.0, 42.0),
    (252.0, 168.0, 168.0, 42.0),
];

const COINS: [(f32, f32); 12] = [
    (250.0, 390.0),
    (290.0, 390.0),
    (330.0, 390.0),
    (470.0, 306.0),
    (510.0, 306.0),
    (550.0, 306.0),
    (680.0, 222.0),
    (720.0, 222.0),
    (60.0, 222.0),
    (100.0, 222.0),
    (300.0, 138.0),
    (340.0, 138.0),
];

/// (x, y, patrol_min_x, patrol_max_x)
const HOSTILES: [(f32, f32, f32, f32); 2] = [
    (500.0, GROUND_TOP - HOSTILE_HEIGHT, 420.0, 900.0),
    (440.0, 336.0 - HOSTILE_HEIGHT, 420.0, 588.0),
];

/// Bottom-center of the exit door.
const DOOR: (f32, f32) = (60.0, GROUND_TOP);

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    /// Center of the coin.
    pub x: f32,
    pub y: f32,
    pub alive: bool,
}

impl Coin {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, alive: true }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, COIN_SIZE, COIN_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hostile {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub min_x: f32,
    pub max_x: f32,
    pub alive: bool,
}

impl Hostile {
    pub fn new(x: f32, y: f32, min_x: f32, max_x: f32) -> Self {
        Self {
            x,
            y,
            vel_x: HOSTILE_SPEED,
            min_x,
            max_x,
            alive: true,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, HOSTILE_WIDTH, HOSTILE_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Door {
    /// Bottom-center anchor.
    pub x: f32,
    pub y: f32,
}

impl Door {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - DOOR_WIDTH / 2.0,
            self.y - DOOR_HEIGHT,
            DOOR_WIDTH,
            DOOR_HEIGHT,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub platforms: Vec<Rect>,
    pub coins: Vec<Coin>,
    pub hostiles: Vec<Hostile>,
    pub door: Door,
    pub key_spawn: (f32, f32),
}

impl Level {
    pub fn first() -> Self {
        let mut platforms = vec![Rect::new(
            0.0,
            GROUND_TOP,
            WORLD_WIDTH,
            WORLD_HEIGHT - GROUND_TOP,
        )];
        platforms.extend(
            PLATFORMS
                .iter()
                .map(|&(x, y, w, h)| Rect::new(x, y, w, h)),
        );

        Self {
            platforms,
            coins: COINS.iter().map(|&(x, y)| Coin::new(x, y)).collect(),
            hostiles: HOSTILES
                .iter()
                .map(|&(x, y, min_x, max_x)| Hostile::new(x, y, min_x, max_x))
                .collect(),
            door: Door {
                x: DOOR.0,
                y: DOOR.1,
            },
            key_spawn: (KEY_RESPAWN_X, KEY_RESPAWN_Y),
        }
    }

    pub fn coins_left(&self) -> usize {
        self.coins.iter().filter(|coin| coin.alive).count()
    }
}

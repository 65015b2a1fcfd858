use shared::{
    PlayerId, Rect, BOUNCE_VELOCITY, JUMP_VELOCITY, PLAYER_SIZE, PLAYER_SPEED,
};

/// The locally controlled character. Simulated on this client between
/// snapshots and never overwritten by its own echoed position.
#[derive(Debug, Clone)]
pub struct Hero {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub on_ground: bool,
    pub coin_pickup_count: u32,
    pub has_key: bool,
    /// Set when a key pickup was sent and the server has not confirmed it yet.
    pub pending_key_pickup: bool,
    /// Set when the key was given up on restart and the server may still list
    /// this hero as the holder.
    pub pending_key_release: bool,
}

impl Hero {
    pub fn new(id: PlayerId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            on_ground: false,
            coin_pickup_count: 0,
            has_key: false,
            pending_key_pickup: false,
            pending_key_release: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }

    /// -1 moves left, 1 moves right, 0 stops.
    pub fn move_dir(&mut self, direction: i8) {
        self.vel_x = f32::from(direction.signum()) * PLAYER_SPEED;
    }

    pub fn jump(&mut self) -> bool {
        if !self.on_ground {
            return false;
        }
        self.vel_y = JUMP_VELOCITY;
        self.on_ground = false;
        true
    }

    pub fn bounce(&mut self) {
        self.vel_y = BOUNCE_VELOCITY;
        self.on_ground = false;
    }

    /// Back to the spawn point with nothing collected.
    pub fn reset(&mut self, x: f32, y: f32) {
        *self = Hero::new(self.id, x, y);
    }
}

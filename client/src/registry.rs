//! Client-side mapping from network identity to remote entity instances.
//!
//! Remote players are fully authoritative from the last snapshot. The
//! locally controlled player is never tracked here, so its echoed snapshot
//! entry can't overwrite the predicted position.

use log::debug;
use shared::{PlayerId, Rect, Snapshot, PLAYER_SIZE};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub coin_pickup_count: u32,
    pub has_key: bool,
    pub alive: bool,
}

impl RemoteEntity {
    fn new(id: PlayerId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            coin_pickup_count: 0,
            has_key: false,
            alive: true,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }
}

pub struct EntityRegistry {
    local_id: PlayerId,
    entities: HashMap<PlayerId, RemoteEntity>,
}

impl EntityRegistry {
    pub fn new(local_id: PlayerId) -> Self {
        Self {
            local_id,
            entities: HashMap::new(),
        }
    }

    pub fn local_id(&self) -> PlayerId {
        self.local_id
    }

    /// Creates an entity for `id`. A live entity is left alone, so duplicate
    /// join notifications are harmless; a removed one is brought back.
    pub fn add_entity(&mut self, id: PlayerId, x: f32, y: f32) -> bool {
        if id == self.local_id {
            return false;
        }
        if self.entities.get(&id).is_some_and(|entity| entity.alive) {
            return false;
        }

        debug!("Adding remote player {} at ({:.1}, {:.1})", id, x, y);
        self.entities.insert(id, RemoteEntity::new(id, x, y));
        true
    }

    /// Moves a live entity. Unknown or removed ids are dropped.
    pub fn update_entity(&mut self, id: PlayerId, x: f32, y: f32) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.x = x;
                entity.y = y;
                true
            }
            None => {
                debug!("Dropping update for unknown player {}", id);
                false
            }
        }
    }

    /// Marks an entity dead. Later updates are ignored until it is re-added.
    pub fn remove_entity(&mut self, id: PlayerId) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.alive = false;
                debug!("Removed remote player {}", id);
                true
            }
            None => {
                debug!("Dropping removal for unknown player {}", id);
                false
            }
        }
    }

    /// Reconciles remote entities with an inbound snapshot. Entities missing
    /// from the snapshot stay until an explicit removal arrives.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        for player in &snapshot.players {
            if player.id == self.local_id {
                continue;
            }

            if !self.add_entity(player.id, player.x, player.y) {
                self.update_entity(player.id, player.x, player.y);
            }

            if let Some(entity) = self.get_mut(player.id) {
                entity.coin_pickup_count = player.coin_pickup_count;
                entity.has_key = player.has_key;
            }
        }
    }

    /// Returns the entity for `id` if it is alive.
    pub fn get(&self, id: PlayerId) -> Option<&RemoteEntity> {
        self.entities.get(&id).filter(|entity| entity.alive)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut RemoteEntity> {
        self.entities.get_mut(&id).filter(|entity| entity.alive)
    }

    /// Live entities ordered by id.
    pub fn live(&self) -> Vec<&RemoteEntity> {
        let mut live: Vec<&RemoteEntity> =
            self.entities.values().filter(|entity| entity.alive).collect();
        live.sort_by_key(|entity| entity.id);
        live
    }

    pub fn len(&self) -> usize {
        self.entities.values().filter(|entity| entity.alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

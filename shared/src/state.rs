//! Shared world state and the reducer that is its only mutation path.
//!
//! The server owns one [`Store`] holding the authoritative [`WorldState`];
//! every change goes through [`Store::dispatch`], which replaces the state
//! with the result of [`reduce`]. Clients keep a mirror store that is
//! refreshed from each inbound [`Snapshot`] with [`Action::Sync`].

use crate::PlayerId;
use log::warn;
use serde::{Deserialize, Serialize};

/// Server-side record of one connected player.
///
/// Key possession is not stored here; it is derived from
/// [`WorldState::key_holder_id`] so that a player holds the key exactly when
/// its id is the holder id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub coin_pickup_count: u32,
}

impl Player {
    pub fn new(id: PlayerId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            coin_pickup_count: 0,
        }
    }
}

/// Wire form of a player inside a [`Snapshot`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub coin_pickup_count: u32,
    pub has_key: bool,
}

/// Immutable copy of the world state taken at one broadcast tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub players: Vec<PlayerSnapshot>,
    pub key_holder_id: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldState {
    /// Players in join order. Broadcast order follows this order.
    pub players: Vec<Player>,
    pub key_holder_id: Option<PlayerId>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn has_key(&self, id: PlayerId) -> bool {
        self.key_holder_id == Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            players: self
                .players
                .iter()
                .map(|player| PlayerSnapshot {
                    id: player.id,
                    x: player.x,
                    y: player.y,
                    coin_pickup_count: player.coin_pickup_count,
                    has_key: self.has_key(player.id),
                })
                .collect(),
            key_holder_id: self.key_holder_id,
        }
    }
}

impl From<&Snapshot> for WorldState {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            players: snapshot
                .players
                .iter()
                .map(|player| Player {
                    id: player.id,
                    x: player.x,
                    y: player.y,
                    coin_pickup_count: player.coin_pickup_count,
                })
                .collect(),
            key_holder_id: snapshot.key_holder_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PlayerJoined {
        id: PlayerId,
        x: f32,
        y: f32,
    },
    PlayerLeft {
        id: PlayerId,
    },
    PlayerMoved {
        id: PlayerId,
        x: f32,
        y: f32,
        coin_pickup_count: u32,
    },
    /// Sets the key holder unconditionally. `None` clears it.
    SetKeyHolder(Option<PlayerId>),
    /// Replaces the whole state with an inbound snapshot.
    Sync(Snapshot),
}

/// Returns the state that results from applying `action` to `state`.
///
/// Pure: `state` is never modified and nothing is logged or sent.
pub fn reduce(state: &WorldState, action: Action) -> WorldState {
    let mut next = state.clone();

    match action {
        Action::PlayerJoined { id, x, y } => {
            if !next.contains(id) {
                next.players.push(Player::new(id, x, y));
            }
        }
        Action::PlayerLeft { id } => {
            next.players.retain(|player| player.id != id);
            if next.key_holder_id == Some(id) {
                next.key_holder_id = None;
            }
        }
        Action::PlayerMoved {
            id,
            x,
            y,
            coin_pickup_count,
        } => {
            if let Some(player) = next.players.iter_mut().find(|player| player.id == id) {
                player.x = x;
                player.y = y;
                player.coin_pickup_count = coin_pickup_count;
            }
        }
        Action::SetKeyHolder(holder) => {
            next.key_holder_id = holder;
        }
        Action::Sync(snapshot) => {
            next = WorldState::from(&snapshot);
        }
    }

    next
}

/// Container for one world state. Reads go through [`Store::state`], writes
/// through [`Store::dispatch`].
#[derive(Debug, Default)]
pub struct Store {
    state: WorldState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Replaces the state with the reduced one. A key holder that is not a
    /// known player is accepted but logged.
    pub fn dispatch(&mut self, action: Action) {
        if let Action::SetKeyHolder(Some(id)) = &action {
            if !self.state.contains(*id) {
                warn!("Key holder set to unknown player {}", id);
            }
        }
        self.state = reduce(&self.state, action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_players() -> WorldState {
        let mut store = Store::new();
        store.dispatch(Action::PlayerJoined { id: 1, x: 10.0, y: 525.0 });
        store.dispatch(Action::PlayerJoined { id: 2, x: 150.0, y: 525.0 });
        store.state().clone()
    }

    #[test]
    fn test_set_key_holder_leaves_players_and_input_untouched() {
        let state = two_players();
        let before = state.clone();

        let next = reduce(&state, Action::SetKeyHolder(Some(1)));

        assert_eq!(next.key_holder_id, Some(1));
        assert_eq!(next.players, state.players);
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_key_holder_accepts_unknown_id() {
        let state = two_players();
        let next = reduce(&state, Action::SetKeyHolder(Some(99)));

        assert_eq!(next.key_holder_id, Some(99));
        assert!(!next.contains(99));
    }

    #[test]
    fn test_dispatch_accepts_unknown_holder() {
        let mut store = Store::new();
        store.dispatch(Action::PlayerJoined { id: 1, x: 0.0, y: 0.0 });

        store.dispatch(Action::SetKeyHolder(Some(5)));

        assert_eq!(store.state().key_holder_id, Some(5));
        assert_eq!(store.state().players.len(), 1);
    }

    #[test]
    fn test_set_key_holder_none_clears() {
        let state = reduce(&two_players(), Action::SetKeyHolder(Some(2)));
        let next = reduce(&state, Action::SetKeyHolder(None));
        assert_eq!(next.key_holder_id, None);
    }

    #[test]
    fn test_player_joined_is_idempotent() {
        let state = two_players();
        let next = reduce(&state, Action::PlayerJoined { id: 1, x: 0.0, y: 0.0 });

        assert_eq!(next.players.len(), 2);
        assert_eq!(next.player(1).unwrap().x, 10.0);
    }

    #[test]
    fn test_player_left_clears_key_holder() {
        let state = reduce(&two_players(), Action::SetKeyHolder(Some(2)));
        let next = reduce(&state, Action::PlayerLeft { id: 2 });

        assert_eq!(next.players.len(), 1);
        assert_eq!(next.key_holder_id, None);
    }

    #[test]
    fn test_player_left_keeps_other_holder() {
        let state = reduce(&two_players(), Action::SetKeyHolder(Some(1)));
        let next = reduce(&state, Action::PlayerLeft { id: 2 });
        assert_eq!(next.key_holder_id, Some(1));
    }

    #[test]
    fn test_player_moved_updates_known_player_only() {
        let state = two_players();
        let next = reduce(
            &state,
            Action::PlayerMoved {
                id: 2,
                x: 300.0,
                y: 100.0,
                coin_pickup_count: 4,
            },
        );

        let moved = next.player(2).unwrap();
        assert_eq!((moved.x, moved.y, moved.coin_pickup_count), (300.0, 100.0, 4));

        let unchanged = reduce(
            &next,
            Action::PlayerMoved {
                id: 7,
                x: 1.0,
                y: 1.0,
                coin_pickup_count: 1,
            },
        );
        assert_eq!(unchanged, next);
    }

    #[test]
    fn test_snapshot_derives_has_key_in_join_order() {
        let state = reduce(&two_players(), Action::SetKeyHolder(Some(2)));
        let snapshot = state.snapshot();

        let ids: Vec<PlayerId> = snapshot.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(!snapshot.players[0].has_key);
        assert!(snapshot.players[1].has_key);
        assert_eq!(snapshot.key_holder_id, Some(2));
    }

    #[test]
    fn test_sync_replaces_state() {
        let source = reduce(&two_players(), Action::SetKeyHolder(Some(1)));
        let snapshot = source.snapshot();

        let mut mirror = Store::new();
        mirror.dispatch(Action::Sync(snapshot));

        assert_eq!(mirror.state(), &source);
    }
}

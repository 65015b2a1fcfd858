//! Key and door puzzle.
//!
//! ```text
//!   KeyAvailable ──pickup──▶ KeyHeld(id) ──door (holder is local, grounded)──▶ EndGame
//!        ▲                       │
//!        └─next frame── KeyRespawning ◀──swap (key gone, holder not local)
//! ```

use crate::hero::Hero;
use log::{debug, info};
use shared::{PlayerId, Rect, KEY_RESPAWN_X, KEY_RESPAWN_Y, SWAP_COST};

pub const KEY_SIZE: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleState {
    KeyAvailable,
    KeyHeld(PlayerId),
    /// The key was just put back; it can be collected from the next frame on.
    KeyRespawning,
    EndGame {
        score: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Not enough coins, or the game is over. Nothing changed.
    Rejected,
    /// Coins were spent. `respawned` tells whether the key came back locally.
    Paid { respawned: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyObject {
    /// Center of the key.
    pub x: f32,
    pub y: f32,
    pub alive: bool,
}

impl KeyObject {
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, KEY_SIZE, KEY_SIZE)
    }
}

#[derive(Debug, Clone)]
pub struct Puzzle {
    state: PuzzleState,
    key: KeyObject,
}

impl Puzzle {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            state: PuzzleState::KeyAvailable,
            key: KeyObject { x, y, alive: true },
        }
    }

    pub fn state(&self) -> PuzzleState {
        self.state
    }

    pub fn key(&self) -> &KeyObject {
        &self.key
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, PuzzleState::EndGame { .. })
    }

    pub fn score(&self) -> Option<u32> {
        match self.state {
            PuzzleState::EndGame { score } => Some(score),
            _ => None,
        }
    }

    pub fn begin_frame(&mut self) {
        if self.state == PuzzleState::KeyRespawning {
            self.state = PuzzleState::KeyAvailable;
        }
    }

    /// Hands the live key to `holder`. Returns false if there is nothing to
    /// pick up.
    pub fn pick_up(&mut self, holder: PlayerId) -> bool {
        if !self.key.alive || self.state != PuzzleState::KeyAvailable {
            return false;
        }

        self.key.alive = false;
        self.state = PuzzleState::KeyHeld(holder);
        true
    }

    /// The door only opens for a key holder standing on the ground.
    pub fn door_opens(&self, has_key: bool, grounded: bool) -> bool {
        !self.is_over() && has_key && grounded
    }

    pub fn finish(&mut self, score: u32) {
        info!("Level complete with score {}", score);
        self.state = PuzzleState::EndGame { score };
    }

    /// Spends `SWAP_COST` coins to take the key away from its current holder.
    ///
    /// The coins are spent whenever the hero can afford it. The key only
    /// reappears here if it is gone locally and the hero is not the holder.
    pub fn try_swap(&mut self, hero: &mut Hero, key_holder: Option<PlayerId>) -> SwapOutcome {
        if self.is_over() || hero.coin_pickup_count < SWAP_COST {
            return SwapOutcome::Rejected;
        }

        hero.coin_pickup_count -= SWAP_COST;

        let respawned = !self.key.alive && key_holder != Some(hero.id);
        if respawned {
            self.respawn();
            hero.has_key = false;
            hero.pending_key_pickup = false;
        }

        SwapOutcome::Paid { respawned }
    }

    /// Applies the key holder from an inbound snapshot and returns the holder
    /// the local mirror should keep.
    ///
    /// Snapshots can be built before the server saw our last key packet. A
    /// missing holder while our own pickup is unconfirmed is stale and the
    /// local claim wins. Likewise the hero named as holder while a release is
    /// unconfirmed is stale and the key stays where it is.
    pub fn observe_key_holder(
        &mut self,
        holder: Option<PlayerId>,
        hero: &mut Hero,
    ) -> Option<PlayerId> {
        if self.is_over() {
            return holder;
        }

        match holder {
            Some(id) if id == hero.id && hero.pending_key_release => {
                debug!("Ignoring stale key holder, local release not confirmed yet");
                None
            }
            Some(id) => {
                if id == hero.id {
                    hero.has_key = true;
                } else {
                    hero.has_key = false;
                }
                hero.pending_key_pickup = false;
                self.key.alive = false;
                self.state = PuzzleState::KeyHeld(id);
                holder
            }
            None if hero.pending_key_pickup => {
                debug!("Ignoring stale key holder, local pickup not confirmed yet");
                Some(hero.id)
            }
            None => {
                hero.has_key = false;
                if !self.key.alive && self.state != PuzzleState::KeyRespawning {
                    self.respawn();
                }
                None
            }
        }
    }

    /// Puts the key back at its level position for a restart.
    pub fn reset(&mut self, x: f32, y: f32) {
        *self = Puzzle::new(x, y);
    }

    fn respawn(&mut self) {
        debug!("Key respawning at ({}, {})", KEY_RESPAWN_X, KEY_RESPAWN_Y);
        self.key = KeyObject {
            x: KEY_RESPAWN_X,
            y: KEY_RESPAWN_Y,
            alive: true,
        };
        self.state = PuzzleState::KeyRespawning;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: PlayerId = 1;
    const OTHER: PlayerId = 2;

    fn hero_with_coins(coins: u32) -> Hero {
        let mut hero = Hero::new(LOCAL, 0.0, 0.0);
        hero.coin_pickup_count = coins;
        hero
    }

    fn puzzle_held_by(holder: PlayerId) -> Puzzle {
        let mut puzzle = Puzzle::new(100.0, 100.0);
        assert!(puzzle.pick_up(holder));
        puzzle
    }

    #[test]
    fn test_pick_up_once() {
        let mut puzzle = Puzzle::new(100.0, 100.0);

        assert!(puzzle.pick_up(LOCAL));
        assert_eq!(puzzle.state(), PuzzleState::KeyHeld(LOCAL));
        assert!(!puzzle.key().alive);
        assert!(!puzzle.pick_up(OTHER));
    }

    #[test]
    fn test_door_requires_key_and_ground() {
        let puzzle = Puzzle::new(0.0, 0.0);
        assert!(puzzle.door_opens(true, true));
        assert!(!puzzle.door_opens(true, false));
        assert!(!puzzle.door_opens(false, true));
        assert!(!puzzle.door_opens(false, false));
    }

    #[test]
    fn test_swap_rejected_below_cost() {
        let mut puzzle = puzzle_held_by(OTHER);
        let mut hero = hero_with_coins(2);

        assert_eq!(puzzle.try_swap(&mut hero, Some(OTHER)), SwapOutcome::Rejected);
        assert_eq!(hero.coin_pickup_count, 2);
        assert_eq!(puzzle.state(), PuzzleState::KeyHeld(OTHER));
        assert!(!puzzle.key().alive);
    }

    #[test]
    fn test_swap_respawns_key_held_by_other() {
        let mut puzzle = puzzle_held_by(OTHER);
        let mut hero = hero_with_coins(3);

        let outcome = puzzle.try_swap(&mut hero, Some(OTHER));

        assert_eq!(outcome, SwapOutcome::Paid { respawned: true });
        assert_eq!(hero.coin_pickup_count, 0);
        assert!(!hero.has_key);
        assert_eq!(puzzle.state(), PuzzleState::KeyRespawning);
        assert_eq!(
            puzzle.key(),
            &KeyObject {
                x: KEY_RESPAWN_X,
                y: KEY_RESPAWN_Y,
                alive: true
            }
        );
    }

    #[test]
    fn test_swap_by_holder_pays_without_respawn() {
        let mut puzzle = puzzle_held_by(LOCAL);
        let mut hero = hero_with_coins(4);
        hero.has_key = true;

        let outcome = puzzle.try_swap(&mut hero, Some(LOCAL));

        assert_eq!(outcome, SwapOutcome::Paid { respawned: false });
        assert_eq!(hero.coin_pickup_count, 1);
        assert!(hero.has_key);
        assert!(!puzzle.key().alive);
    }

    #[test]
    fn test_swap_with_live_key_pays_without_respawn() {
        let mut puzzle = Puzzle::new(10.0, 10.0);
        let mut hero = hero_with_coins(3);

        let outcome = puzzle.try_swap(&mut hero, None);

        assert_eq!(outcome, SwapOutcome::Paid { respawned: false });
        assert_eq!(hero.coin_pickup_count, 0);
        assert_eq!(puzzle.key().x, 10.0);
    }

    #[test]
    fn test_respawned_key_collectable_next_frame() {
        let mut puzzle = puzzle_held_by(OTHER);
        let mut hero = hero_with_coins(3);
        puzzle.try_swap(&mut hero, Some(OTHER));

        assert!(!puzzle.pick_up(LOCAL));
        puzzle.begin_frame();
        assert_eq!(puzzle.state(), PuzzleState::KeyAvailable);
        assert!(puzzle.pick_up(LOCAL));
    }

    #[test]
    fn test_finish_is_terminal() {
        let mut puzzle = puzzle_held_by(LOCAL);
        let mut hero = hero_with_coins(5);
        puzzle.finish(5);

        assert_eq!(puzzle.score(), Some(5));
        assert!(!puzzle.door_opens(true, true));
        assert_eq!(puzzle.try_swap(&mut hero, Some(OTHER)), SwapOutcome::Rejected);
        assert_eq!(
            puzzle.observe_key_holder(None, &mut hero),
            None
        );
        assert_eq!(puzzle.state(), PuzzleState::EndGame { score: 5 });
    }

    #[test]
    fn test_observe_other_holder_hides_key() {
        let mut puzzle = Puzzle::new(10.0, 10.0);
        let mut hero = hero_with_coins(0);

        let mirrored = puzzle.observe_key_holder(Some(OTHER), &mut hero);

        assert_eq!(mirrored, Some(OTHER));
        assert!(!puzzle.key().alive);
        assert!(!hero.has_key);
        assert_eq!(puzzle.state(), PuzzleState::KeyHeld(OTHER));
    }

    #[test]
    fn test_observe_confirms_local_pickup() {
        let mut puzzle = puzzle_held_by(LOCAL);
        let mut hero = hero_with_coins(0);
        hero.has_key = true;
        hero.pending_key_pickup = true;

        puzzle.observe_key_holder(Some(LOCAL), &mut hero);

        assert!(hero.has_key);
        assert!(!hero.pending_key_pickup);
    }

    #[test]
    fn test_observe_stale_none_keeps_local_claim() {
        let mut puzzle = puzzle_held_by(LOCAL);
        let mut hero = hero_with_coins(0);
        hero.has_key = true;
        hero.pending_key_pickup = true;

        let mirrored = puzzle.observe_key_holder(None, &mut hero);

        assert_eq!(mirrored, Some(LOCAL));
        assert!(hero.has_key);
        assert!(!puzzle.key().alive);
    }

    #[test]
    fn test_observe_stale_local_holder_after_release() {
        let mut puzzle = Puzzle::new(100.0, 100.0);
        let mut hero = hero_with_coins(0);
        hero.pending_key_release = true;

        let mirrored = puzzle.observe_key_holder(Some(LOCAL), &mut hero);

        assert_eq!(mirrored, None);
        assert!(!hero.has_key);
        assert!(puzzle.key().alive);
        assert_eq!(puzzle.state(), PuzzleState::KeyAvailable);
    }

    #[test]
    fn test_observe_stripped_holder_gets_key_back() {
        let mut puzzle = puzzle_held_by(LOCAL);
        let mut hero = hero_with_coins(0);
        hero.has_key = true;

        puzzle.observe_key_holder(None, &mut hero);

        assert!(!hero.has_key);
        assert!(puzzle.key().alive);
        assert_eq!((puzzle.key().x, puzzle.key().y), (KEY_RESPAWN_X, KEY_RESPAWN_Y));
    }
}

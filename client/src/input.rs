//! Keyboard sampling with edge detection

use crate::game::InputEvent;
use macroquad::prelude::*;

/// Key states from one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub swap: bool,
}

/// Turns held keys into discrete input events.
///
/// A move event is only produced when the direction changes, jump and swap
/// only on the frame their key goes down.
#[derive(Default)]
pub struct InputManager {
    previous: KeyState,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples the keyboard. A/D or the arrows move, Space, W or Up jumps, E swaps.
    pub fn update(&mut self) -> Vec<InputEvent> {
        let keys = KeyState {
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            jump: is_key_down(KeyCode::Space)
                || is_key_down(KeyCode::W)
                || is_key_down(KeyCode::Up),
            swap: is_key_down(KeyCode::E),
        };
        self.events_for(keys)
    }

    pub fn events_for(&mut self, keys: KeyState) -> Vec<InputEvent> {
        let mut events = Vec::new();

        let heading = direction(keys);
        if heading != direction(self.previous) {
            events.push(InputEvent::Move(heading));
        }
        if keys.jump && !self.previous.jump {
            events.push(InputEvent::Jump);
        }
        if keys.swap && !self.previous.swap {
            events.push(InputEvent::Swap);
        }

        self.previous = keys;
        events
    }
}

fn direction(keys: KeyState) -> i8 {
    match (keys.left, keys.right) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

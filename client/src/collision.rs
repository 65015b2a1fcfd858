//! Per-frame gameplay rules driven by the contacts the physics step reports.
//!
//! Rules run in a fixed order (coins, hostiles, key, door). Within a rule,
//! contacts are handled in the order they were reported. A restart or the end
//! of the game stops evaluation for the rest of the frame.

use crate::hero::Hero;
use crate::level::Level;
use crate::puzzle::Puzzle;
use crate::registry::EntityRegistry;
use log::{debug, info};
use shared::{Action, Packet, PlayerId, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Coin(usize),
    Hostile(usize),
    Key,
    Door,
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactDetails {
    /// Positive while moving down the screen.
    pub vertical_velocity: f32,
    pub grounded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub character: PlayerId,
    pub target: Target,
    pub details: ContactDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Jump,
    Coin,
    Stomp,
    Key,
    Door,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Effect(Effect),
    Restart,
    EndGame { score: u32 },
    Send(Packet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Coin,
    Hostile,
    Key,
    Door,
}

pub const RULE_ORDER: [Rule; 4] = [Rule::Coin, Rule::Hostile, Rule::Key, Rule::Door];

impl Target {
    /// Solid geometry is a movement constraint only and has no rule.
    pub fn rule(&self) -> Option<Rule> {
        match self {
            Target::Coin(_) => Some(Rule::Coin),
            Target::Hostile(_) => Some(Rule::Hostile),
            Target::Key => Some(Rule::Key),
            Target::Door => Some(Rule::Door),
            Target::Solid => None,
        }
    }
}

/// Everything a rule may touch during one frame.
pub struct World<'a> {
    pub hero: &'a mut Hero,
    pub registry: &'a mut EntityRegistry,
    pub level: &'a mut Level,
    pub puzzle: &'a mut Puzzle,
    pub store: &'a mut Store,
}

enum Flow {
    Continue,
    Stop,
}

pub fn evaluate(world: &mut World, contacts: &[Contact]) -> Vec<Command> {
    let mut commands = Vec::new();

    for rule in RULE_ORDER {
        for contact in contacts.iter().filter(|c| c.target.rule() == Some(rule)) {
            let flow = if contact.character == world.hero.id {
                apply_local(world, rule, contact, &mut commands)
            } else {
                apply_remote(world, rule, contact);
                Flow::Continue
            };

            if let Flow::Stop = flow {
                return commands;
            }
        }
    }

    commands
}

fn apply_local(world: &mut World, rule: Rule, contact: &Contact, commands: &mut Vec<Command>) -> Flow {
    match (rule, contact.target) {
        (Rule::Coin, Target::Coin(index)) => {
            if let Some(coin) = world.level.coins.get_mut(index).filter(|c| c.alive) {
                coin.alive = false;
                world.hero.coin_pickup_count += 1;
                commands.push(Command::Effect(Effect::Coin));
            }
        }
        (Rule::Hostile, Target::Hostile(index)) => {
            let Some(hostile) = world.level.hostiles.get_mut(index).filter(|h| h.alive) else {
                return Flow::Continue;
            };

            commands.push(Command::Effect(Effect::Stomp));
            if contact.details.vertical_velocity > 0.0 {
                hostile.alive = false;
                world.hero.bounce();
            } else {
                info!("Player {} was hit, restarting level", world.hero.id);
                commands.push(Command::Restart);
                return Flow::Stop;
            }
        }
        (Rule::Key, Target::Key) => {
            if world.puzzle.pick_up(world.hero.id) {
                world.store.dispatch(Action::SetKeyHolder(Some(world.hero.id)));
                world.hero.has_key = true;
                world.hero.pending_key_pickup = true;
                world.hero.pending_key_release = false;
                commands.push(Command::Send(Packet::KeyPickup));
                commands.push(Command::Effect(Effect::Key));
            }
        }
        (Rule::Door, Target::Door) => {
            if world.puzzle.door_opens(world.hero.has_key, contact.details.grounded) {
                let score = world.hero.coin_pickup_count;
                world.puzzle.finish(score);
                commands.push(Command::Effect(Effect::Door));
                commands.push(Command::EndGame { score });
                commands.push(Command::Send(Packet::GameOver { score }));
                return Flow::Stop;
            }
        }
        _ => {}
    }

    Flow::Continue
}

/// Remote players only collect coins and the key. Damage and the exit are
/// decided by their own client.
fn apply_remote(world: &mut World, rule: Rule, contact: &Contact) {
    if world.registry.get(contact.character).is_none() {
        debug!("Ignoring contact for unknown player {}", contact.character);
        return;
    }

    match (rule, contact.target) {
        (Rule::Coin, Target::Coin(index)) => {
            if let Some(coin) = world.level.coins.get_mut(index).filter(|c| c.alive) {
                coin.alive = false;
                if let Some(remote) = world.registry.get_mut(contact.character) {
                    remote.coin_pickup_count += 1;
                }
            }
        }
        (Rule::Key, Target::Key) => {
            if world.puzzle.pick_up(contact.character) {
                world
                    .store
                    .dispatch(Action::SetKeyHolder(Some(contact.character)));
                if let Some(remote) = world.registry.get_mut(contact.character) {
                    remote.has_key = true;
                }
            }
        }
        _ => {}
    }
}

use crate::collision::{self, Command, Effect, World};
use crate::hero::Hero;
use crate::level::Level;
use crate::physics;
use crate::puzzle::{Puzzle, SwapOutcome};
use crate::registry::EntityRegistry;
use log::{debug, info, warn};
use shared::{Action, Packet, PlayerId, Snapshot, Store};

/// Seconds of simulated time between two position reports.
pub const POSITION_SEND_INTERVAL: f32 = 0.05;

/// Discrete commands from the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// -1 left, 1 right, 0 stop.
    Move(i8),
    Jump,
    Swap,
}

/// Local simulation for one connected client.
///
/// Owns the mirrored world state and every client-side entity. The frame
/// loop feeds it input events, inbound packets and frame times, and sends
/// whatever packets come back.
pub struct ClientGame {
    store: Store,
    hero: Hero,
    registry: EntityRegistry,
    level: Level,
    puzzle: Puzzle,
    spawn: (f32, f32),
    effects: Vec<Effect>,
    since_position_send: f32,
}

impl ClientGame {
    pub fn new(local_id: PlayerId, spawn_x: f32, spawn_y: f32) -> Self {
        let level = Level::first();
        let (key_x, key_y) = level.key_spawn;

        let mut store = Store::new();
        store.dispatch(Action::PlayerJoined {
            id: local_id,
            x: spawn_x,
            y: spawn_y,
        });

        Self {
            store,
            hero: Hero::new(local_id, spawn_x, spawn_y),
            registry: EntityRegistry::new(local_id),
            level,
            puzzle: Puzzle::new(key_x, key_y),
            spawn: (spawn_x, spawn_y),
            effects: Vec::new(),
            since_position_send: 0.0,
        }
    }

    pub fn local_id(&self) -> PlayerId {
        self.hero.id
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_over(&self) -> bool {
        self.puzzle.is_over()
    }

    pub fn score(&self) -> Option<u32> {
        self.puzzle.score()
    }

    /// Drains the effects raised since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<Packet> {
        if self.is_over() {
            return Vec::new();
        }

        match event {
            InputEvent::Move(direction) => {
                self.hero.move_dir(direction);
                Vec::new()
            }
            InputEvent::Jump => {
                if self.hero.jump() {
                    self.effects.push(Effect::Jump);
                }
                Vec::new()
            }
            InputEvent::Swap => self.swap(),
        }
    }

    fn swap(&mut self) -> Vec<Packet> {
        let key_holder = self.store.state().key_holder_id;

        match self.puzzle.try_swap(&mut self.hero, key_holder) {
            SwapOutcome::Rejected => {
                debug!(
                    "Swap rejected with {} coins",
                    self.hero.coin_pickup_count
                );
                Vec::new()
            }
            SwapOutcome::Paid { respawned } => {
                info!(
                    "Swap paid, {} coins left, key respawned: {}",
                    self.hero.coin_pickup_count, respawned
                );
                if respawned {
                    self.store.dispatch(Action::SetKeyHolder(None));
                }
                vec![Packet::SwapAction]
            }
        }
    }

    pub fn apply_packet(&mut self, packet: Packet) {
        match packet {
            Packet::ServerUpdate { snapshot } => self.apply_snapshot(snapshot),
            Packet::PlayerLeft { id } => {
                info!("Player {} left", id);
                self.registry.remove_entity(id);
                self.store.dispatch(Action::PlayerLeft { id });
                self.observe_key_holder();
            }
            Packet::Disconnected { reason } => {
                warn!("Disconnected by server: {}", reason);
            }
            other => {
                debug!("Ignoring packet {:?}", other);
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        debug!(
            "Snapshot with {} players, key holder {:?}",
            snapshot.players.len(),
            snapshot.key_holder_id
        );

        if snapshot.key_holder_id != Some(self.hero.id) {
            self.hero.pending_key_release = false;
        }

        self.registry.apply_snapshot(&snapshot);
        self.store.dispatch(Action::Sync(snapshot));
        self.observe_key_holder();
    }

    /// Lets the puzzle reconcile against the mirrored key holder, then keeps
    /// the mirror in line with what the puzzle decided.
    fn observe_key_holder(&mut self) {
        let holder = self.store.state().key_holder_id;
        let kept = self.puzzle.observe_key_holder(holder, &mut self.hero);
        if kept != holder {
            self.store.dispatch(Action::SetKeyHolder(kept));
        }
    }

    /// Advances the simulation by `dt` seconds and returns the packets to send.
    pub fn tick(&mut self, dt: f32) -> Vec<Packet> {
        if self.is_over() {
            return Vec::new();
        }

        self.puzzle.begin_frame();
        physics::step_hero(&mut self.hero, &self.level.platforms, dt);
        physics::step_hostiles(&mut self.level.hostiles, dt);

        let contacts =
            physics::detect_contacts(&self.hero, &self.registry, &self.level, self.puzzle.key());
        let commands = {
            let mut world = World {
                hero: &mut self.hero,
                registry: &mut self.registry,
                level: &mut self.level,
                puzzle: &mut self.puzzle,
                store: &mut self.store,
            };
            collision::evaluate(&mut world, &contacts)
        };

        let mut outbound = Vec::new();
        for command in commands {
            match command {
                Command::Effect(effect) => {
                    debug!("Effect {:?}", effect);
                    self.effects.push(effect);
                }
                Command::Send(packet) => outbound.push(packet),
                Command::Restart => outbound.extend(self.restart()),
                Command::EndGame { score } => {
                    info!("Game over, final score {}", score);
                }
            }
        }

        self.since_position_send += dt;
        if !self.is_over() && self.since_position_send >= POSITION_SEND_INTERVAL {
            self.since_position_send = 0.0;
            outbound.push(Packet::PlayerUpdate {
                x: self.hero.x,
                y: self.hero.y,
                coin_pickup_count: self.hero.coin_pickup_count,
            });
        }

        outbound
    }

    /// Starts the level over. A held key is released back to the server, and
    /// snapshots still naming this hero as holder are ignored until one
    /// without it arrives.
    pub fn restart(&mut self) -> Vec<Packet> {
        let held = self.hero.has_key || self.store.state().has_key(self.hero.id);

        self.level = Level::first();
        let (spawn_x, spawn_y) = self.spawn;
        self.hero.reset(spawn_x, spawn_y);
        let (key_x, key_y) = self.level.key_spawn;
        self.puzzle.reset(key_x, key_y);

        let mut outbound = Vec::new();
        if held {
            self.store.dispatch(Action::SetKeyHolder(None));
            outbound.push(Packet::KeyReleased);
        }
        self.observe_key_holder();
        self.hero.pending_key_release = held;

        outbound
    }
}

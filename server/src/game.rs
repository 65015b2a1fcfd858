use log::{debug, info, warn};
use rand::Rng;
use shared::{Action, PlayerId, Store, SPAWN_Y};
use std::sync::Arc;
use tokio::sync::RwLock;

/// World state container shared between the event loop and the broadcast loop.
pub type SharedStore = Arc<RwLock<Store>>;

/// Server-side gameplay bookkeeping. Translates client messages into reducer
/// actions on the injected store.
pub struct ServerGame {
    store: SharedStore,
    results: Vec<(PlayerId, u32)>,
}

impl ServerGame {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            results: Vec::new(),
        }
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Adds a player at a spawn point and returns that spawn point.
    pub async fn join(&mut self, id: PlayerId) -> (f32, f32) {
        let (x, y) = spawn_position();
        self.store
            .write()
            .await
            .dispatch(Action::PlayerJoined { id, x, y });

        info!("Added player {} at ({:.1}, {:.1})", id, x, y);
        (x, y)
    }

    pub async fn leave(&mut self, id: PlayerId) {
        self.store.write().await.dispatch(Action::PlayerLeft { id });
        info!("Removed player {}", id);
    }

    pub async fn player_update(&mut self, id: PlayerId, x: f32, y: f32, coin_pickup_count: u32) {
        self.store.write().await.dispatch(Action::PlayerMoved {
            id,
            x,
            y,
            coin_pickup_count,
        });
    }

    pub async fn key_pickup(&mut self, id: PlayerId) {
        self.store
            .write()
            .await
            .dispatch(Action::SetKeyHolder(Some(id)));
        info!("Player {} picked up the key", id);
    }

    /// Clears the key holder if `id` is the one holding it.
    pub async fn key_released(&mut self, id: PlayerId) {
        let mut store = self.store.write().await;
        if store.state().key_holder_id == Some(id) {
            store.dispatch(Action::SetKeyHolder(None));
            info!("Player {} released the key", id);
        }
    }

    /// A swap strips the key from whoever holds it, unless that is the
    /// requester itself.
    pub async fn swap(&mut self, id: PlayerId) {
        let mut store = self.store.write().await;
        match store.state().key_holder_id {
            Some(holder) if holder != id => {
                store.dispatch(Action::SetKeyHolder(None));
                info!("Player {} swapped the key away from player {}", id, holder);
            }
            Some(_) => debug!("Player {} swapped while holding the key", id),
            None => debug!("Player {} swapped with no key holder", id),
        }
    }

    pub async fn game_over(&mut self, id: PlayerId, score: u32) {
        if !self.store.read().await.state().contains(id) {
            warn!("Game over from unknown player {}", id);
        }
        info!("Player {} finished with score {}", id, score);
        self.results.push((id, score));
    }

    /// Final scores reported so far, in arrival order.
    pub fn results(&self) -> &[(PlayerId, u32)] {
        &self.results
    }
}

fn spawn_position() -> (f32, f32) {
    let x = rand::thread_rng().gen_range(0.0..200.0);
    (x, SPAWN_Y)
}

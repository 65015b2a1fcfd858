//! Runtime settings for the game server.

use shared::{BROADCAST_PERIOD_MS, MAX_PLAYERS};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the UDP socket binds to, e.g. `127.0.0.1:8080`.
    pub bind_addr: String,
    /// Time between two `ServerUpdate` broadcasts.
    pub broadcast_period: Duration,
    pub max_clients: usize,
    /// Silence after which a client counts as disconnected.
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            broadcast_period: Duration::from_millis(BROADCAST_PERIOD_MS),
            max_clients: MAX_PLAYERS,
            client_timeout: Duration::from_secs(5),
        }
    }
}

//! Connection tracking for the game server
//!
//! UDP has no connection state, so this module supplies the join/leave events
//! the rest of the server relies on:
//! - Client registration on `Connect` with a capacity limit
//! - Address lookup to attribute incoming packets to a player id
//! - Activity tracking and timeout detection for silent clients

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client
#[derive(Debug)]
pub struct Client {
    /// Player id assigned by the server
    pub id: PlayerId,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    /// Creates a client with the given id and network address
    ///
    /// The client counts as active from the moment it is created, so the
    /// timeout clock starts at the `Connect` packet.
    pub fn new(id: PlayerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Marks the client as active right now
    ///
    /// Called for every packet attributed to this client, whatever its type.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Checks if the client has exceeded the connection timeout
    ///
    /// Returns true if nothing arrived from this client within `timeout`,
    /// which the server treats the same as an explicit disconnect.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected clients
///
/// Ids start at 1 and are never reused within a server run, so a stale
/// packet from a replaced connection can't be mistaken for the new one.
pub struct ClientManager {
    clients: HashMap<PlayerId, Client>,
    next_client_id: PlayerId,
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty client roster with the given capacity
    ///
    /// The game is for two players, so the server passes `MAX_PLAYERS`
    /// unless configured lower.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to register a new client connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at
    /// capacity. The id is taken from a counter that only grows, and the
    /// address is kept for routing replies and broadcasts.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<PlayerId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Removes a client from the roster
    ///
    /// Returns false if it was already gone, so callers can tell a duplicate
    /// `Disconnect` from a real one and announce the departure only once.
    pub fn remove_client(&mut self, client_id: &PlayerId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Finds the client registered for a network address
    ///
    /// Used on `Connect` to detect a client reconnecting from the same
    /// address, whose old entry is replaced.
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Attributes an incoming packet to a client
    ///
    /// Refreshes the activity timestamp of the client at `addr` and returns
    /// its id, or None for an address that never connected.
    pub fn touch_by_addr(&mut self, addr: SocketAddr) -> Option<PlayerId> {
        self.clients
            .values_mut()
            .find(|client| client.addr == addr)
            .map(|client| {
                client.touch();
                client.id
            })
    }

    /// Removes clients that have been silent longer than `timeout`
    ///
    /// Returns the ids of the removed clients so the server can drop them
    /// from the world state and notify the remaining players.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<PlayerId> {
        let timed_out: Vec<PlayerId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// Gets all client ids and their addresses, used for broadcasting
    pub fn get_client_addrs(&self) -> Vec<(PlayerId, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    /// Number of connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

//! Server network layer handling UDP communications and the event loop

use crate::broadcast::BroadcastLoop;
use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::ServerGame;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{Packet, PlayerId, Store, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: PlayerId },
}

/// Messages queued for the network sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<PlayerId>,
    },
}

/// Authoritative game server
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game: ServerGame,
    broadcast: BroadcastLoop,
    client_timeout: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
}

impl Server {
    /// Creates a new server bound to the configured address
    ///
    /// Binds the UDP socket and sets up the channels between the helper
    /// tasks and the main loop. Nothing runs until [`Server::run`] is called.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = Arc::new(UdpSocket::bind(&config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        let store = Arc::new(RwLock::new(Store::new()));

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            game: ServerGame::new(store),
            broadcast: BroadcastLoop::new(config.broadcast_period),
            client_timeout: config.client_timeout,
            server_tx,
            server_rx,
            game_tx,
            game_rx: Some(game_rx),
        })
    }

    /// Address the socket is actually bound to, useful when binding port 0
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drains the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let Some(mut game_rx) = self.game_rx.take() else {
            return;
        };
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that reports silent clients as disconnected
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let timeout = self.client_timeout;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(timeout)
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    /// Serializes a packet with bincode and sends it in one datagram
    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), ServerError> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// Queues a packet for a single address
    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Queues a packet for every connected client except `exclude`
    fn broadcast_packet(&self, packet: Packet, exclude: Option<PlayerId>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet, exclude })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Drops a player from the world and tells the remaining clients.
    async fn remove_player(&mut self, client_id: PlayerId) {
        self.game.leave(client_id).await;
        self.broadcast_packet(Packet::PlayerLeft { id: client_id }, Some(client_id));
    }

    /// Processes one incoming packet
    ///
    /// `Connect` is handled on its own since the sender has no id yet. Every
    /// other packet must come from a registered address, which also counts
    /// as activity for the timeout check.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        if let Packet::Connect { client_version } = packet {
            self.handle_connect(client_version, addr).await;
            return;
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.touch_by_addr(addr)
        };

        let Some(client_id) = client_id else {
            warn!("Packet from unknown address {}", addr);
            return;
        };

        match packet {
            Packet::PlayerUpdate {
                x,
                y,
                coin_pickup_count,
            } => {
                self.game
                    .player_update(client_id, x, y, coin_pickup_count)
                    .await;
            }
            Packet::KeyPickup => self.game.key_pickup(client_id).await,
            Packet::KeyReleased => self.game.key_released(client_id).await,
            Packet::SwapAction => self.game.swap(client_id).await,
            Packet::GameOver { score } => self.game.game_over(client_id, score).await,
            Packet::Disconnect => {
                let removed = {
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&client_id)
                };
                if removed {
                    self.remove_player(client_id).await;
                }
            }
            _ => {
                warn!("Unexpected packet type from client {}", client_id);
            }
        }
    }

    /// Handles the connect handshake
    ///
    /// Rejects a protocol version mismatch and a full server with a
    /// `Disconnected` reply. A client reconnecting from a known address
    /// replaces its old entry, which the other player sees as a leave.
    /// Otherwise the player joins the world and receives its id and spawn.
    async fn handle_connect(&mut self, client_version: u32, addr: SocketAddr) {
        info!(
            "Client connecting from {} (version: {})",
            addr, client_version
        );

        if client_version != PROTOCOL_VERSION {
            self.send_packet(
                Packet::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            );
            return;
        }

        // Remove existing connection if present
        let existing_client_id = {
            let mut clients = self.clients.write().await;
            let existing = clients.find_client_by_addr(addr);
            if let Some(existing_id) = existing {
                clients.remove_client(&existing_id);
            }
            existing
        };

        if let Some(existing_id) = existing_client_id {
            info!("Replacing existing client {} from {}", existing_id, addr);
            self.remove_player(existing_id).await;
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr)
        };

        match client_id {
            Some(client_id) => {
                let (spawn_x, spawn_y) = self.game.join(client_id).await;
                self.send_packet(
                    Packet::Connected {
                        client_id,
                        spawn_x,
                        spawn_y,
                    },
                    addr,
                );
            }
            None => {
                self.send_packet(
                    Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                    addr,
                );
            }
        }
    }

    /// Main server loop: starts the broadcast loop and the helper tasks, then
    /// processes network events one at a time.
    ///
    /// Fails before anything is spawned if the broadcast loop can't start.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.broadcast.start(self.game.store(), self.game_tx.clone())?;
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::ClientTimeout { client_id } => {
                    info!("Client {} timed out", client_id);
                    self.remove_player(client_id).await;
                }
            }
        }

        info!("Server shutting down");
        self.broadcast.stop();
        Ok(())
    }
}

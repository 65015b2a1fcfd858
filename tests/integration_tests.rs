//! Integration tests across the shared, server and client crates
//!
//! The network tests run a real server on a loopback UDP socket. The
//! scenario tests pass packets between client games and the server's
//! bookkeeping by hand, so they run without sockets or timing.

use assert_approx_eq::assert_approx_eq;
use bincode::{deserialize, serialize};
use client::game::{ClientGame, InputEvent};
use server::config::ServerConfig;
use server::game::ServerGame;
use server::network::Server;
use shared::{Packet, PlayerId, Snapshot, Store, KEY_RESPAWN_X, KEY_RESPAWN_Y, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tokio::time::{timeout, Instant};

const WAIT: Duration = Duration::from_secs(3);

async fn start_server(broadcast_ms: u64) -> SocketAddr {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        broadcast_period: Duration::from_millis(broadcast_ms),
        ..ServerConfig::default()
    };
    let mut server = Server::new(config).await.unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

struct TestClient {
    socket: UdpSocket,
    server: SocketAddr,
}

impl TestClient {
    async fn new(server: SocketAddr) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Self { socket, server }
    }

    async fn send(&self, packet: &Packet) {
        let data = serialize(packet).unwrap();
        self.socket.send_to(&data, self.server).await.unwrap();
    }

    /// Reads packets until one matches, skipping the rest.
    async fn recv_matching<F>(&self, mut matches: F) -> Packet
    where
        F: FnMut(&Packet) -> bool,
    {
        let deadline = Instant::now() + WAIT;
        let mut buffer = [0u8; 2048];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (len, _) = timeout(remaining, self.socket.recv_from(&mut buffer))
                .await
                .expect("timed out waiting for packet")
                .unwrap();
            let packet: Packet = deserialize(&buffer[..len]).unwrap();
            if matches(&packet) {
                return packet;
            }
        }
    }

    async fn connect(&self) -> PlayerId {
        self.send(&Packet::Connect {
            client_version: PROTOCOL_VERSION,
        })
        .await;

        match self
            .recv_matching(|p| matches!(p, Packet::Connected { .. }))
            .await
        {
            Packet::Connected { client_id, .. } => client_id,
            other => panic!("expected Connected, got {:?}", other),
        }
    }

    async fn next_snapshot<F>(&self, mut matches: F) -> Snapshot
    where
        F: FnMut(&Snapshot) -> bool,
    {
        let packet = self
            .recv_matching(|p| match p {
                Packet::ServerUpdate { snapshot } => matches(snapshot),
                _ => false,
            })
            .await;

        match packet {
            Packet::ServerUpdate { snapshot } => snapshot,
            other => panic!("expected ServerUpdate, got {:?}", other),
        }
    }
}

/// NETWORK TESTS against a running server
mod server_tests {
    use super::*;

    #[tokio::test]
    async fn two_players_join_and_both_appear_in_snapshot() {
        let server = start_server(50).await;
        let a = TestClient::new(server).await;
        let b = TestClient::new(server).await;

        let a_id = a.connect().await;
        let b_id = b.connect().await;
        assert_ne!(a_id, b_id);

        let snapshot = a.next_snapshot(|s| s.players.len() == 2).await;
        let ids: Vec<PlayerId> = snapshot.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a_id, b_id]);
        assert_eq!(snapshot.key_holder_id, None);
        assert!(snapshot.players.iter().all(|p| !p.has_key));
    }

    #[tokio::test]
    async fn third_player_is_turned_away() {
        let server = start_server(50).await;
        let a = TestClient::new(server).await;
        let b = TestClient::new(server).await;
        let c = TestClient::new(server).await;
        a.connect().await;
        b.connect().await;

        c.send(&Packet::Connect {
            client_version: PROTOCOL_VERSION,
        })
        .await;
        let reply = c
            .recv_matching(|p| matches!(p, Packet::Disconnected { .. }))
            .await;

        assert_eq!(
            reply,
            Packet::Disconnected {
                reason: "Server full".to_string()
            }
        );
    }

    #[tokio::test]
    async fn version_mismatch_is_rejected() {
        let server = start_server(50).await;
        let a = TestClient::new(server).await;

        a.send(&Packet::Connect {
            client_version: PROTOCOL_VERSION + 1,
        })
        .await;
        let reply = a
            .recv_matching(|p| matches!(p, Packet::Disconnected { .. }))
            .await;

        assert_eq!(
            reply,
            Packet::Disconnected {
                reason: "Protocol version mismatch".to_string()
            }
        );
    }

    #[tokio::test]
    async fn malformed_datagram_is_ignored() {
        let server = start_server(50).await;
        let a = TestClient::new(server).await;

        a.socket.send_to(b"not a packet", server).await.unwrap();

        assert!(a.connect().await > 0);
    }

    #[tokio::test]
    async fn key_pickup_and_swap_reach_other_player() {
        let server = start_server(50).await;
        let a = TestClient::new(server).await;
        let b = TestClient::new(server).await;
        let a_id = a.connect().await;
        let b_id = b.connect().await;

        a.send(&Packet::KeyPickup).await;
        let snapshot = b.next_snapshot(|s| s.key_holder_id == Some(a_id)).await;
        let holder = snapshot.players.iter().find(|p| p.id == a_id).unwrap();
        assert!(holder.has_key);
        a.next_snapshot(|s| s.key_holder_id == Some(a_id)).await;

        b.send(&Packet::SwapAction).await;
        let snapshot = a.next_snapshot(|s| s.key_holder_id.is_none()).await;
        assert!(snapshot.players.iter().all(|p| !p.has_key));
        assert!(snapshot.players.iter().any(|p| p.id == b_id));
    }

    #[tokio::test]
    async fn position_updates_are_broadcast() {
        let server = start_server(50).await;
        let a = TestClient::new(server).await;
        let b = TestClient::new(server).await;
        let a_id = a.connect().await;
        b.connect().await;

        a.send(&Packet::PlayerUpdate {
            x: 321.0,
            y: 123.0,
            coin_pickup_count: 4,
        })
        .await;

        let snapshot = b
            .next_snapshot(|s| {
                s.players
                    .iter()
                    .any(|p| p.id == a_id && p.coin_pickup_count == 4)
            })
            .await;
        let entry = snapshot.players.iter().find(|p| p.id == a_id).unwrap();
        assert_eq!((entry.x, entry.y), (321.0, 123.0));
    }

    #[tokio::test]
    async fn disconnect_notifies_remaining_player() {
        let server = start_server(50).await;
        let a = TestClient::new(server).await;
        let b = TestClient::new(server).await;
        let a_id = a.connect().await;
        let b_id = b.connect().await;

        a.send(&Packet::KeyPickup).await;
        b.next_snapshot(|s| s.key_holder_id == Some(a_id)).await;

        a.send(&Packet::Disconnect).await;
        let left = b
            .recv_matching(|p| matches!(p, Packet::PlayerLeft { .. }))
            .await;
        assert_eq!(left, Packet::PlayerLeft { id: a_id });

        let snapshot = b.next_snapshot(|s| s.players.len() == 1).await;
        assert_eq!(snapshot.players[0].id, b_id);
        assert_eq!(snapshot.key_holder_id, None);
    }
}

/// GAMEPLAY SCENARIOS between client games and server bookkeeping
mod scenario_tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    // Left end of the first raised platform, on top of the first coin.
    const COIN_RUN_SPAWN: (f32, f32) = (234.0, 388.0);
    // Overlapping the key at its spawn point.
    const KEY_SPAWN: (f32, f32) = (KEY_RESPAWN_X - 16.0, KEY_RESPAWN_Y - 16.0);

    fn new_server_game() -> ServerGame {
        ServerGame::new(Arc::new(RwLock::new(Store::new())))
    }

    async fn broadcast(server: &ServerGame) -> Packet {
        let snapshot = server.store().read().await.state().snapshot();
        Packet::ServerUpdate { snapshot }
    }

    /// Runs right along the first platform and picks up its three coins.
    fn collect_three_coins(game: &mut ClientGame) {
        game.handle_input(InputEvent::Move(1));
        for _ in 0..27 {
            game.tick(DT);
        }
        game.handle_input(InputEvent::Move(0));
        assert_approx_eq!(game.hero().x, 324.0, 1e-2);
        assert_eq!(game.hero().coin_pickup_count, 3);
    }

    #[test]
    fn coin_count_only_grows_while_collecting() {
        let mut game = ClientGame::new(1, COIN_RUN_SPAWN.0, COIN_RUN_SPAWN.1);
        game.handle_input(InputEvent::Move(1));

        let mut last = 0;
        for _ in 0..27 {
            game.tick(DT);
            assert!(game.hero().coin_pickup_count >= last);
            last = game.hero().coin_pickup_count;
        }

        assert_eq!(last, 3);
        assert_eq!(game.level().coins_left(), 9);
    }

    #[tokio::test]
    async fn swap_takes_key_from_other_player() {
        let mut server = new_server_game();
        server.join(1).await;
        server.join(2).await;

        let mut a = ClientGame::new(1, KEY_SPAWN.0, KEY_SPAWN.1);
        let mut b = ClientGame::new(2, COIN_RUN_SPAWN.0, COIN_RUN_SPAWN.1);

        let packets = a.tick(DT);
        assert!(packets.contains(&Packet::KeyPickup));
        server.key_pickup(1).await;

        let update = broadcast(&server).await;
        a.apply_packet(update.clone());
        b.apply_packet(update);
        assert!(a.hero().has_key);
        assert!(!a.hero().pending_key_pickup);
        assert!(!b.puzzle().key().alive);

        collect_three_coins(&mut b);
        let packets = b.handle_input(InputEvent::Swap);
        assert_eq!(packets, vec![Packet::SwapAction]);
        assert_eq!(b.hero().coin_pickup_count, 0);
        let key = b.puzzle().key();
        assert!(key.alive);
        assert_eq!((key.x, key.y), (KEY_RESPAWN_X, KEY_RESPAWN_Y));

        server.swap(2).await;
        assert_eq!(server.store().read().await.state().key_holder_id, None);

        a.apply_packet(broadcast(&server).await);
        assert!(!a.hero().has_key);
        assert!(a.puzzle().key().alive);
    }

    #[test]
    fn swap_below_cost_changes_nothing() {
        let mut server = new_server_game();
        let update = tokio_test::block_on(async {
            server.join(1).await;
            server.join(2).await;
            server.key_pickup(1).await;
            broadcast(&server).await
        });

        let mut b = ClientGame::new(2, 150.0, 514.0);
        b.apply_packet(update);

        assert!(b.handle_input(InputEvent::Swap).is_empty());
        assert_eq!(b.hero().coin_pickup_count, 0);
        assert!(!b.puzzle().key().alive);
        assert_eq!(b.store().state().key_holder_id, Some(1));
    }

    #[tokio::test]
    async fn key_pickup_with_no_holder() {
        let mut server = new_server_game();
        server.join(1).await;

        let mut a = ClientGame::new(1, KEY_SPAWN.0, KEY_SPAWN.1);
        a.apply_packet(broadcast(&server).await);
        assert_eq!(a.store().state().key_holder_id, None);

        a.tick(DT);

        assert_eq!(a.store().state().key_holder_id, Some(1));
        assert!(a.hero().has_key);
        assert!(!a.puzzle().key().alive);
    }

    #[tokio::test]
    async fn grounded_holder_at_door_ends_game() {
        let mut server = new_server_game();
        server.join(1).await;
        server.key_pickup(1).await;

        let mut a = ClientGame::new(1, 44.0, 514.0);
        a.apply_packet(broadcast(&server).await);

        let packets = a.tick(DT);
        let score = packets.iter().find_map(|p| match p {
            Packet::GameOver { score } => Some(*score),
            _ => None,
        });
        assert_eq!(score, Some(0));

        server.game_over(1, 0).await;
        assert_eq!(server.results(), &[(1, 0)]);
    }

    #[tokio::test]
    async fn airborne_holder_waits_until_landing() {
        let mut server = new_server_game();
        server.join(1).await;
        server.key_pickup(1).await;

        let mut a = ClientGame::new(1, 44.0, 480.0);
        a.apply_packet(broadcast(&server).await);

        a.tick(DT);
        assert!(!a.is_over());
        assert!(!a.hero().on_ground);

        for _ in 0..60 {
            a.tick(DT);
        }
        assert!(a.is_over());
        assert_eq!(a.score(), Some(0));
    }
}

use clap::Parser;
use client::game::ClientGame;
use client::input::InputManager;
use client::network::Connection;
use client::rendering::Renderer;
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::{Packet, PROTOCOL_VERSION};
use std::time::{Duration, Instant};

const CONNECT_RETRY: Duration = Duration::from_secs(1);
/// Longest frame the simulation will step in one go.
const MAX_FRAME_TIME: f32 = 1.0 / 20.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Window width
    #[arg(short = 'w', long, default_value = "960")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: i32,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Hourglass".to_owned(),
        window_width: args.width,
        window_height: args.height,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }
    info!("Controls: A/D to move, Space to jump, E to swap");

    let mut connection = match Connection::open(&args.server, args.fake_ping) {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to open connection: {}", e);
            return;
        }
    };

    let mut renderer = Renderer::new(args.width as f32, args.height as f32);
    let mut input = InputManager::new();
    let mut game: Option<ClientGame> = None;
    let mut last_connect: Option<Instant> = None;

    'frames: loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        for packet in connection.poll() {
            match packet {
                Packet::Connected {
                    client_id,
                    spawn_x,
                    spawn_y,
                } => {
                    if game.is_none() {
                        info!("Connected! Client ID: {}", client_id);
                        game = Some(ClientGame::new(client_id, spawn_x, spawn_y));
                    }
                }
                Packet::Disconnected { reason } => {
                    warn!("Disconnected: {}", reason);
                    break 'frames;
                }
                other => {
                    if let Some(game) = game.as_mut() {
                        game.apply_packet(other);
                    }
                }
            }
        }

        match game.as_mut() {
            None => {
                if last_connect.map_or(true, |sent| sent.elapsed() >= CONNECT_RETRY) {
                    connection.send(Packet::Connect {
                        client_version: PROTOCOL_VERSION,
                    });
                    last_connect = Some(Instant::now());
                }
                renderer.render_connecting(&args.server);
            }
            Some(game) => {
                for event in input.update() {
                    for packet in game.handle_input(event) {
                        connection.send(packet);
                    }
                }

                let dt = get_frame_time().min(MAX_FRAME_TIME);
                for packet in game.tick(dt) {
                    connection.send(packet);
                }

                renderer.play_effects(&game.take_effects());
                renderer.render(game, dt);
            }
        }

        next_frame().await;
    }

    connection.close();
}

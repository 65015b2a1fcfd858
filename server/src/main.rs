use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Milliseconds between world state broadcasts
    #[arg(
        short,
        long,
        default_value_t = shared::BROADCAST_PERIOD_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    broadcast_ms: u64,

    /// Maximum number of simultaneous players (at most 2)
    #[arg(
        short,
        long,
        default_value_t = shared::MAX_PLAYERS,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new()
            .range(1..=shared::MAX_PLAYERS as u64)
    )]
    max_clients: usize,

    /// Seconds of silence before a client is dropped
    #[arg(short, long, default_value = "5")]
    timeout_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            bind_addr: format!("{}:{}", args.host, args.port),
            broadcast_period: Duration::from_millis(args.broadcast_ms),
            max_clients: args.max_clients,
            client_timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::from(Args::parse());
    info!(
        "Starting server on {} (broadcast every {:?}, max {} players)",
        config.bind_addr, config.broadcast_period, config.max_clients
    );

    let mut server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

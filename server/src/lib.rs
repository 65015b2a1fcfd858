//! # Game Server Library
//!
//! Authoritative server for the two-player key-and-door platformer. It owns
//! the canonical world state (who is playing, where they were last reported,
//! how many coins they hold and who holds the key) and pushes it to every
//! connected client at a fixed cadence.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative World State
//! The world state lives in a single [`shared::Store`] that is created by the
//! server and injected into every component that touches it. All writes go
//! through the reducer; the broadcast loop only reads.
//!
//! ### Client Management
//! UDP has no connections, so the server derives join and leave events from
//! `Connect`/`Disconnect` packets and from a silence timeout.
//!
//! ### State Broadcasting
//! A timer task samples the store every broadcast period (5 s by default)
//! and sends one `ServerUpdate` snapshot to every client. Empty worlds are
//! skipped. Nothing is acknowledged or retried; the next tick supersedes a
//! lost one.
//!
//! ## Module Organization
//!
//! - `broadcast`: the periodic snapshot push, guarded against double start
//! - `client_manager`: connection tracking, capacity and timeouts
//! - `config`: runtime settings
//! - `error`: the server error type
//! - `game`: maps client messages (key pickup, swap, game over, ...) onto
//!   reducer actions
//! - `network`: UDP socket tasks and the single-threaded event loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod config;
pub mod error;
pub mod game;
pub mod network;

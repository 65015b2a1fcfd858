//! # Game Client Library
//!
//! Client side of the two-player key-and-door platformer. The client
//! simulates its own character locally and mirrors everything else from the
//! server's periodic snapshots.
//!
//! ## Architecture Overview
//!
//! ### Local Authority
//! The controlled character (the hero) is never moved by server data. Its
//! position, coins, hostile hits and the exit door are decided here and
//! reported to the server.
//!
//! ### Snapshot Reconciliation
//! Remote players are taken verbatim from the latest snapshot. The key holder
//! is applied too, except when it would undo a pickup the server has not
//! seen yet.
//!
//! ### Frame Rules
//! Each frame the physics step reports contacts, and a fixed-order rule table
//! turns them into pickups, stomps, restarts and the end of the game.
//!
//! ## Module Organization
//!
//! - `game`: per-frame driver tying the modules below together
//! - `hero`: the controlled character
//! - `registry`: remote players by network identity
//! - `collision`: gameplay rules for one frame of contacts
//! - `puzzle`: key possession, door condition and key respawn
//! - `physics`: gravity, platform resolution and contact detection
//! - `level`: the level layout
//! - `input`: keyboard sampling into input events
//! - `network`: UDP transport on a background thread
//! - `rendering`: macroquad drawing and HUD

pub mod collision;
pub mod game;
pub mod hero;
pub mod input;
pub mod level;
pub mod network;
pub mod physics;
pub mod puzzle;
pub mod registry;
pub mod rendering;

//! Workspace root package. It owns the cross-crate integration and benchmark
//! tests under `tests/`; the game itself lives in the `shared`, `server` and
//! `client` member crates.

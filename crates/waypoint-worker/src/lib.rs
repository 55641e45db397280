//! Waypoint worker library logic.
//!
//! The worker hosts one voice agent: it warms up the VAD model, then serves
//! an HTTP dispatch surface that assembles and starts an agent session per
//! incoming job. The binary in `main.rs` wires configuration, logging, and
//! graceful shutdown around [`app`].

pub mod config;
pub mod server;

pub use server::{app, AppState, SessionSlot};

//! Server and client sessions
//!
//! A session owns a transport, a message registry, and the dispatch
//! pipeline. Starting it launches a background poll thread that pumps the
//! transport at [`SessionConfig::poll_hz`] iterations per second and
//! decodes inbound frames; the embedding application calls `update()` at
//! its own cadence to receive them. Sends serialize into a shared frame
//! buffer under a lock and may come from any thread.

mod client;
mod config;
mod core;
mod error;
mod server;

pub use client::Client;
pub use config::{DEFAULT_POLL_HZ, SessionConfig};
pub use error::SessionError;
pub use server::Server;

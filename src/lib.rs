//! Courier — typed binary message protocol layer for peer sessions
//!
//! Courier turns raw transport frames into typed messages and back. Message
//! codecs are derived at compile time from field lists, a runtime registry
//! assigns each type a dense 1-byte wire identifier, and a threaded
//! dispatch pipeline decodes frames off a background poll thread and
//! delivers them to type-scoped subscribers when the application calls
//! `update()`. Connection management, framing, and delivery guarantees
//! belong to the pluggable [`Transport`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use courier::{message, protocol, Client, MemoryNetwork, Server};
//!
//! message! {
//!     /// Ping probe carrying a sequence counter.
//!     pub struct PingMessage {
//!         pub sequence: u32,
//!     }
//! }
//!
//! protocol! {
//!     pub enum GameProtocol {
//!         PingMessage,
//!     }
//! }
//!
//! # fn main() -> Result<(), courier::SessionError> {
//! let network = MemoryNetwork::new();
//!
//! let mut server = Server::new(GameProtocol::registry(), network.endpoint());
//! server.subscribe::<PingMessage, _>(|ping, peer| {
//!     println!("ping {} from {peer}", ping.sequence);
//! })?;
//! server.start(7777)?;
//!
//! let mut client = Client::new(GameProtocol::registry(), network.endpoint());
//! client.connect("memory", 7777)?;
//!
//! loop {
//!     server.update();
//!     client.update();
//!     if let Some(_peer) = client.peer() {
//!         client.send(&PingMessage { sequence: 42 })?;
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Wire format
//!
//! ```text
//! [1 byte: MessageTypeId] [field_1] [field_2] ... [field_n]
//! ```
//!
//! Fields travel little-endian at fixed widths in declaration order, with
//! no length prefix and no checksum: both ends must run identical codecs
//! and register the same protocol. Identifiers are assigned in declaration
//! order, so a shared [`protocol!`](crate::protocol!) declaration keeps
//! the two ends in agreement.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod dispatch;
pub mod protocol;
pub mod session;
pub mod transport;

pub use dispatch::{Envelope, SubscriptionId};
pub use protocol::{
    Error, FrameReader, FrameWriter, Message, MessageRegistry, MessageTypeId, Result, Value,
    Variant,
};
pub use session::{Client, DEFAULT_POLL_HZ, Server, SessionConfig, SessionError};
pub use transport::{
    Delivery, DisconnectReason, MemoryNetwork, MemoryTransport, PeerId, Transport, TransportError,
    TransportEvent,
};

/// Courier wire protocol version.
pub const VERSION: &str = "0.1.0";

//! Transport collaborator interface
//!
//! The session rides on an external transport that owns connection
//! establishment, framing, and delivery guarantees. This module specifies
//! exactly the surface the session consumes — an event pump plus a raw
//! frame send — and ships [`MemoryNetwork`], an in-process implementation
//! used by the tests and demos. Real network transports live outside this
//! crate and implement [`Transport`].

mod error;
mod memory;

use bytes::Bytes;
use std::fmt;

pub use error::TransportError;
pub use memory::{MemoryNetwork, MemoryTransport};

/// Transport-assigned peer handle.
///
/// Opaque to the protocol layer; valid for the lifetime of the underlying
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerId(u64);

impl PeerId {
    /// Wrap a raw peer handle.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Delivery guarantee requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Delivery {
    /// Frames arrive, and in send order.
    #[default]
    ReliableOrdered,
    /// Frames arrive, order unspecified.
    ReliableUnordered,
    /// Best effort, no guarantee at all.
    Unreliable,
}

/// Why a peer connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The remote side closed the connection.
    RemoteClose,
    /// This side closed the connection.
    LocalClose,
    /// The transport gave up on the peer.
    Timeout,
}

/// Event surfaced by the transport's pump.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A peer connection was established.
    PeerConnected(PeerId),
    /// A peer connection ended.
    PeerDisconnected {
        /// The departed peer.
        peer: PeerId,
        /// Why the connection ended.
        reason: DisconnectReason,
    },
    /// A raw frame arrived from a peer.
    Frame {
        /// Sending peer.
        peer: PeerId,
        /// Frame payload, exactly as sent.
        payload: Bytes,
    },
}

/// External delivery mechanism the session rides on.
///
/// Implementations must be internally synchronized: the session pumps from
/// its poll thread while `send` may be called from any thread.
pub trait Transport: Send + Sync + 'static {
    /// Start accepting connections on `port`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; e.g. the port is taken.
    fn listen(&self, port: u16) -> Result<(), TransportError>;

    /// Connect to a listening endpoint.
    ///
    /// The `key` is an opaque credential forwarded to the remote side's
    /// acceptance policy.
    ///
    /// # Errors
    ///
    /// Implementation-defined; e.g. nothing listens at the address.
    fn connect(&self, address: &str, port: u16, key: &str) -> Result<(), TransportError>;

    /// Drain pending events into `sink`, in arrival order.
    ///
    /// Called once per poll iteration from the session's poll thread.
    fn pump(&self, sink: &mut dyn FnMut(TransportEvent));

    /// Send one frame to each of `peers` with the requested delivery mode.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownPeer`] when a target is not
    /// connected to this endpoint.
    fn send(&self, peers: &[PeerId], frame: &[u8], delivery: Delivery)
    -> Result<(), TransportError>;

    /// Disconnect every connected peer.
    fn disconnect_all(&self);
}

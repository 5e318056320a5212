//! Transport error types

use thiserror::Error;

use super::PeerId;

/// Errors surfaced by a [`Transport`](super::Transport) implementation
#[derive(Error, Debug)]
pub enum TransportError {
    /// Endpoint has no connected peer
    #[error("transport endpoint is not connected")]
    NotConnected,

    /// Send targeted a peer this endpoint does not know
    #[error("unknown peer {peer}")]
    UnknownPeer {
        /// The unknown peer handle
        peer: PeerId,
    },

    /// No endpoint is listening on the requested port
    #[error("no listener on port {port}")]
    NoListener {
        /// Target port
        port: u16,
    },

    /// Another endpoint already listens on the requested port
    #[error("port {port} is already in use")]
    PortInUse {
        /// Contested port
        port: u16,
    },

    /// Underlying I/O failure
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

//! Session error types

use thiserror::Error;

use crate::protocol;
use crate::transport::TransportError;

/// Errors surfaced by session operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation requires a running session
    #[error("session is not running")]
    NotRunning,

    /// Session was started twice
    #[error("session is already running")]
    AlreadyRunning,

    /// Client session has no connected peer yet
    #[error("no connected peer")]
    NotConnected,

    /// Protocol-layer failure (lookup or encode)
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::Error),

    /// Transport-layer failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The poll thread could not be spawned
    #[error("failed to spawn poll thread: {0}")]
    PollThread(std::io::Error),
}

//! Server session: listens for peers and speaks a protocol to them

use tracing::info;

use crate::dispatch::SubscriptionId;
use crate::protocol::{Message, MessageRegistry, Variant};
use crate::transport::{DisconnectReason, PeerId, Transport};

use super::core::SessionCore;
use super::{SessionConfig, SessionError};

/// Listening end of a session.
///
/// Owns the transport, the registry, and the dispatch pipeline. Call
/// [`update`](Server::update) regularly from one thread — typically the
/// application main loop — to deliver queued messages and lifecycle events;
/// sends may come from any thread.
pub struct Server<P, T>
where
    P: Message + Send + 'static,
    T: Transport,
{
    core: SessionCore<P, T>,
}

impl<P, T> Server<P, T>
where
    P: Message + Send + 'static,
    T: Transport,
{
    /// Create a server with default configuration.
    pub fn new(registry: MessageRegistry<P>, transport: T) -> Self {
        Self::with_config(registry, transport, SessionConfig::default())
    }

    /// Create a server with explicit configuration.
    pub fn with_config(
        registry: MessageRegistry<P>,
        transport: T,
        config: SessionConfig,
    ) -> Self {
        Self {
            core: SessionCore::new(registry, transport, config),
        }
    }

    /// Start listening on `port` and launch the poll thread.
    ///
    /// # Errors
    ///
    /// Fails when the session is already running or the transport cannot
    /// listen on the port.
    pub fn start(&mut self, port: u16) -> Result<(), SessionError> {
        self.core.start_with(|transport| transport.listen(port))?;
        info!(port, "server listening");
        Ok(())
    }

    /// Disconnect every peer and stop the session.
    ///
    /// Pending undelivered messages are discarded and all subscriptions
    /// removed. Does not wait for the poll thread to exit.
    pub fn stop(&mut self) {
        self.core.stop();
    }

    /// Whether the session is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }

    /// Deliver queued lifecycle events and messages to their handlers.
    pub fn update(&mut self) {
        self.core.update();
    }

    /// Currently connected peers, in arrival order.
    #[must_use]
    pub fn peers(&self) -> Vec<PeerId> {
        self.core.peers()
    }

    /// Register a handler for every inbound `M`.
    ///
    /// Handlers for one type run in subscription order.
    ///
    /// # Errors
    ///
    /// Fails when `M` is not part of the registered protocol.
    pub fn subscribe<M, F>(&mut self, handler: F) -> Result<SubscriptionId, SessionError>
    where
        M: Variant<P>,
        F: FnMut(&M, PeerId) + Send + 'static,
    {
        self.core.subscribe::<M, F>(handler)
    }

    /// Remove a previously registered handler.
    ///
    /// Returns whether the handler was still registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.core.unsubscribe(id)
    }

    /// Register a hook invoked (during [`update`](Server::update)) when a
    /// peer connects.
    pub fn on_peer_connected(&mut self, hook: impl FnMut(PeerId) + Send + 'static) {
        self.core.on_peer_connected(hook);
    }

    /// Register a hook invoked (during [`update`](Server::update)) when a
    /// peer disconnects.
    pub fn on_peer_disconnected(
        &mut self,
        hook: impl FnMut(PeerId, DisconnectReason) + Send + 'static,
    ) {
        self.core.on_peer_disconnected(hook);
    }

    /// Send a message to one peer.
    ///
    /// # Errors
    ///
    /// Fails when the session is not running, the message type is not
    /// registered, encoding fails, or the transport rejects the send.
    pub fn send_to<M: Variant<P>>(&self, message: &M, peer: PeerId) -> Result<(), SessionError> {
        self.core.send_to_peers(message, &[peer])
    }

    /// Send one encoded frame to each peer in `peers`.
    ///
    /// The message is serialized once under the send lock.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`send_to`](Server::send_to).
    pub fn send_to_many<M: Variant<P>>(
        &self,
        message: &M,
        peers: &[PeerId],
    ) -> Result<(), SessionError> {
        self.core.send_to_peers(message, peers)
    }

    /// Send a message to every currently connected peer.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`send_to`](Server::send_to).
    pub fn broadcast<M: Variant<P>>(&self, message: &M) -> Result<(), SessionError> {
        let peers = self.core.peers();
        self.core.send_to_peers(message, &peers)
    }
}

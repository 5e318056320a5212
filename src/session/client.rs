//! Client session: connects to one server and speaks a protocol to it

use tracing::info;

use crate::dispatch::SubscriptionId;
use crate::protocol::{Message, MessageRegistry, Variant};
use crate::transport::{DisconnectReason, PeerId, Transport};

use super::core::SessionCore;
use super::{SessionConfig, SessionError};

/// Connecting end of a session.
///
/// Mirrors [`Server`](super::Server) but talks to a single peer: the
/// server it connected to. The connect key sent to the transport comes
/// from [`SessionConfig::connect_key`].
pub struct Client<P, T>
where
    P: Message + Send + 'static,
    T: Transport,
{
    core: SessionCore<P, T>,
}

impl<P, T> Client<P, T>
where
    P: Message + Send + 'static,
    T: Transport,
{
    /// Create a client with default configuration.
    pub fn new(registry: MessageRegistry<P>, transport: T) -> Self {
        Self::with_config(registry, transport, SessionConfig::default())
    }

    /// Create a client with explicit configuration.
    pub fn with_config(
        registry: MessageRegistry<P>,
        transport: T,
        config: SessionConfig,
    ) -> Self {
        Self {
            core: SessionCore::new(registry, transport, config),
        }
    }

    /// Connect to a listening server and launch the poll thread.
    ///
    /// The peer handle becomes available once the transport reports the
    /// connection, on a later poll iteration — see [`peer`](Client::peer).
    ///
    /// # Errors
    ///
    /// Fails when the session is already running or the transport cannot
    /// reach the address.
    pub fn connect(&mut self, address: &str, port: u16) -> Result<(), SessionError> {
        let key = self.core.config().connect_key.clone();
        self.core
            .start_with(|transport| transport.connect(address, port, &key))?;
        info!(address, port, "client connecting");
        Ok(())
    }

    /// Disconnect from the server and stop the session.
    ///
    /// Pending undelivered messages are discarded and all subscriptions
    /// removed. Does not wait for the poll thread to exit.
    pub fn disconnect(&mut self) {
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

    /// The connected server peer, once the connection is established.
    #[must_use]
    pub fn peer(&self) -> Option<PeerId> {
        self.core.first_peer()
    }

    /// Register a handler for every inbound `M`.
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

    /// Register a hook invoked (during [`update`](Client::update)) when
    /// the connection is established.
    pub fn on_connected(&mut self, hook: impl FnMut(PeerId) + Send + 'static) {
        self.core.on_peer_connected(hook);
    }

    /// Register a hook invoked (during [`update`](Client::update)) when
    /// the connection ends.
    pub fn on_disconnected(
        &mut self,
        hook: impl FnMut(PeerId, DisconnectReason) + Send + 'static,
    ) {
        self.core.on_peer_disconnected(hook);
    }

    /// Send a message to the server.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotConnected`] before the connection is
    /// established; otherwise the same failure modes as a server send.
    pub fn send<M: Variant<P>>(&self, message: &M) -> Result<(), SessionError> {
        let peer = self.core.first_peer().ok_or(SessionError::NotConnected)?;
        self.core.send_to_peers(message, &[peer])
    }
}

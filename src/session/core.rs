//! Shared session state and the poll thread
//!
//! [`SessionCore`] is everything a server and a client have in common: the
//! transport handle, the registry, the mailbox/subscription pair, the
//! shared outgoing frame writer behind its send lock, and the poll thread.
//! The wrappers in `server.rs` / `client.rs` only differ in how they open
//! the transport and how they pick send targets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::dispatch::{Envelope, Handler, Mailbox, SubscriptionId, Subscriptions};
use crate::protocol::{
    Error, FrameReader, FrameWriter, Message, MessageRegistry, MessageTypeId, Variant,
};
use crate::transport::{Delivery, DisconnectReason, PeerId, Transport, TransportEvent};

use super::{SessionConfig, SessionError};

/// Connection lifecycle event queued by the poll thread and replayed to
/// session hooks on the consumer thread.
enum LifecycleEvent {
    Connected(PeerId),
    Disconnected(PeerId, DisconnectReason),
}

pub(crate) struct SessionCore<P, T>
where
    P: Message + Send + 'static,
    T: Transport,
{
    transport: Arc<T>,
    registry: Arc<MessageRegistry<P>>,
    mailbox: Arc<Mailbox<P>>,
    subscriptions: Subscriptions<P>,
    /// Drain buffer reused every update cycle.
    drain: Vec<Envelope<P>>,
    lifecycle: Arc<Mutex<Vec<LifecycleEvent>>>,
    /// Connected peers in arrival order, maintained by the poll thread.
    peers: Arc<Mutex<Vec<PeerId>>>,
    running: Arc<AtomicBool>,
    /// Shared outgoing frame buffer; the lock is the send lock.
    writer: Mutex<FrameWriter>,
    config: SessionConfig,
    poll_thread: Option<JoinHandle<()>>,
    connected_hooks: Vec<Box<dyn FnMut(PeerId) + Send>>,
    disconnected_hooks: Vec<Box<dyn FnMut(PeerId, DisconnectReason) + Send>>,
}

impl<P, T> SessionCore<P, T>
where
    P: Message + Send + 'static,
    T: Transport,
{
    pub(crate) fn new(registry: MessageRegistry<P>, transport: T, config: SessionConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            registry: Arc::new(registry),
            mailbox: Arc::new(Mailbox::new()),
            subscriptions: Subscriptions::new(),
            drain: Vec::new(),
            lifecycle: Arc::new(Mutex::new(Vec::new())),
            peers: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            writer: Mutex::new(FrameWriter::new()),
            config,
            poll_thread: None,
            connected_hooks: Vec::new(),
            disconnected_hooks: Vec::new(),
        }
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Open the transport via `open` and launch the poll thread.
    pub(crate) fn start_with(
        &mut self,
        open: impl FnOnce(&T) -> Result<(), crate::transport::TransportError>,
    ) -> Result<(), SessionError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(SessionError::AlreadyRunning);
        }
        if let Err(err) = open(&self.transport) {
            self.running.store(false, Ordering::Release);
            return Err(err.into());
        }

        let ctx = PollContext {
            transport: Arc::clone(&self.transport),
            registry: Arc::clone(&self.registry),
            mailbox: Arc::clone(&self.mailbox),
            lifecycle: Arc::clone(&self.lifecycle),
            peers: Arc::clone(&self.peers),
            running: Arc::clone(&self.running),
            poll_hz: self.config.poll_hz,
        };
        match thread::Builder::new()
            .name("courier-poll".to_string())
            .spawn(move || poll_loop(ctx))
        {
            Ok(handle) => {
                self.poll_thread = Some(handle);
                debug!(poll_hz = self.config.poll_hz, "session started");
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(SessionError::PollThread(err))
            }
        }
    }

    /// Disconnect peers, clear subscriptions, and discard pending
    /// envelopes. The poll thread observes the cleared flag on its next
    /// iteration and exits; this does not wait for it.
    pub(crate) fn stop(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.transport.disconnect_all();
        self.subscriptions.clear();
        self.mailbox.clear();
        self.lifecycle
            .lock()
            .expect("lifecycle mutex poisoned")
            .clear();
        self.peers.lock().expect("peer list mutex poisoned").clear();
        self.poll_thread = None;
        debug!("session stopped");
    }

    /// Replay lifecycle events to hooks, then drain the mailbox and fan
    /// envelopes out to subscribers. Call from the consumer thread.
    pub(crate) fn update(&mut self) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        self.replay_lifecycle();
        self.mailbox.drain_into(&mut self.drain);
        for envelope in &self.drain {
            let delivered = self.subscriptions.dispatch(envelope);
            if delivered == 0 {
                trace!(type_id = %envelope.type_id, "envelope had no subscribers");
            }
        }
    }

    fn replay_lifecycle(&mut self) {
        let events = {
            let mut queue = self.lifecycle.lock().expect("lifecycle mutex poisoned");
            std::mem::take(&mut *queue)
        };
        for event in events {
            match event {
                LifecycleEvent::Connected(peer) => {
                    for hook in &mut self.connected_hooks {
                        hook(peer);
                    }
                }
                LifecycleEvent::Disconnected(peer, reason) => {
                    for hook in &mut self.disconnected_hooks {
                        hook(peer, reason);
                    }
                }
            }
        }
    }

    pub(crate) fn subscribe<M, F>(&mut self, handler: F) -> Result<SubscriptionId, SessionError>
    where
        M: Variant<P>,
        F: FnMut(&M, PeerId) + Send + 'static,
    {
        let type_id = self.registry.id_of::<M>()?;
        let mut handler = handler;
        let wrapped: Handler<P> = Box::new(move |message, peer| {
            if let Some(concrete) = M::peel(message) {
                handler(concrete, peer);
            }
        });
        Ok(self.subscriptions.add(type_id, wrapped))
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(id)
    }

    pub(crate) fn on_peer_connected(&mut self, hook: impl FnMut(PeerId) + Send + 'static) {
        self.connected_hooks.push(Box::new(hook));
    }

    pub(crate) fn on_peer_disconnected(
        &mut self,
        hook: impl FnMut(PeerId, DisconnectReason) + Send + 'static,
    ) {
        self.disconnected_hooks.push(Box::new(hook));
    }

    pub(crate) fn peers(&self) -> Vec<PeerId> {
        self.peers.lock().expect("peer list mutex poisoned").clone()
    }

    pub(crate) fn first_peer(&self) -> Option<PeerId> {
        self.peers
            .lock()
            .expect("peer list mutex poisoned")
            .first()
            .copied()
    }

    /// Serialize `message` into the shared frame buffer under the send
    /// lock and hand it to the transport for every peer in `peers`.
    pub(crate) fn send_to_peers<M: Variant<P>>(
        &self,
        message: &M,
        peers: &[PeerId],
    ) -> Result<(), SessionError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(SessionError::NotRunning);
        }
        let type_id = self.registry.id_of::<M>()?;
        let mut writer = self.writer.lock().expect("send mutex poisoned");
        writer.reset();
        writer.put_u8(type_id.raw());
        message.encode(&mut *writer)?;
        self.transport
            .send(peers, writer.as_slice(), Delivery::ReliableOrdered)?;
        Ok(())
    }
}

impl<P, T> Drop for SessionCore<P, T>
where
    P: Message + Send + 'static,
    T: Transport,
{
    fn drop(&mut self) {
        // Let a still-running poll thread wind down on its own.
        self.running.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Poll thread
// ---------------------------------------------------------------------------

struct PollContext<P, T> {
    transport: Arc<T>,
    registry: Arc<MessageRegistry<P>>,
    mailbox: Arc<Mailbox<P>>,
    lifecycle: Arc<Mutex<Vec<LifecycleEvent>>>,
    peers: Arc<Mutex<Vec<PeerId>>>,
    running: Arc<AtomicBool>,
    poll_hz: u32,
}

fn frame_duration(poll_hz: u32) -> Duration {
    Duration::from_secs(1) / poll_hz.max(1)
}

fn poll_loop<P, T>(ctx: PollContext<P, T>)
where
    P: Message + Send + 'static,
    T: Transport,
{
    let target = frame_duration(ctx.poll_hz);
    trace!(target_us = target.as_micros() as u64, "poll thread running");
    while ctx.running.load(Ordering::Acquire) {
        let started = Instant::now();
        ctx.transport.pump(&mut |event| handle_event(&ctx, event));
        // Pace to the target frequency. Overruns only shorten the next
        // sleep to zero; there is no catch-up.
        if let Some(sleep) = target.checked_sub(started.elapsed()) {
            if !sleep.is_zero() {
                thread::sleep(sleep);
            }
        }
    }
    trace!("poll thread exiting");
}

fn handle_event<P, T>(ctx: &PollContext<P, T>, event: TransportEvent)
where
    P: Message + Send + 'static,
    T: Transport,
{
    match event {
        TransportEvent::Frame { peer, payload } => {
            match decode_frame(&ctx.registry, peer, payload) {
                Ok(envelope) => ctx.mailbox.push(envelope),
                Err(err) => warn!(%peer, error = %err, "dropping undecodable frame"),
            }
        }
        TransportEvent::PeerConnected(peer) => {
            debug!(%peer, "peer connected");
            ctx.peers
                .lock()
                .expect("peer list mutex poisoned")
                .push(peer);
            ctx.lifecycle
                .lock()
                .expect("lifecycle mutex poisoned")
                .push(LifecycleEvent::Connected(peer));
        }
        TransportEvent::PeerDisconnected { peer, reason } => {
            debug!(%peer, ?reason, "peer disconnected");
            ctx.peers
                .lock()
                .expect("peer list mutex poisoned")
                .retain(|known| *known != peer);
            ctx.lifecycle
                .lock()
                .expect("lifecycle mutex poisoned")
                .push(LifecycleEvent::Disconnected(peer, reason));
        }
    }
}

/// Decode one inbound frame: leading id byte, blank construction, field
/// decode. Trailing bytes are ignored — the codec alone defines the frame
/// contents.
fn decode_frame<P: Message>(
    registry: &MessageRegistry<P>,
    peer: PeerId,
    payload: Bytes,
) -> Result<Envelope<P>, Error> {
    let mut reader = FrameReader::new(payload);
    let type_id = MessageTypeId::new(reader.take_u8()?);
    let mut message = registry.blank(type_id)?;
    message.decode(&mut reader)?;
    Ok(Envelope {
        message,
        peer,
        type_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::message! {
        struct ProbeMessage {
            sequence: u32,
        }
    }

    crate::protocol! {
        enum ProbeProtocol {
            ProbeMessage,
        }
    }

    #[test]
    fn test_frame_duration_matches_frequency() {
        assert_eq!(frame_duration(60), Duration::from_secs(1) / 60);
        assert_eq!(frame_duration(1), Duration::from_secs(1));
        // Zero is clamped rather than dividing by zero.
        assert_eq!(frame_duration(0), Duration::from_secs(1));
    }

    #[test]
    fn test_decode_frame_reads_id_then_fields() {
        let registry = ProbeProtocol::registry();
        let payload = Bytes::from_static(&[0, 42, 0, 0, 0]);
        let envelope = decode_frame(&registry, PeerId::new(3), payload).unwrap();
        assert_eq!(envelope.type_id.raw(), 0);
        assert_eq!(envelope.peer, PeerId::new(3));
        assert_eq!(
            envelope.message,
            ProbeProtocol::ProbeMessage(ProbeMessage { sequence: 42 })
        );
    }

    #[test]
    fn test_decode_frame_rejects_unknown_id() {
        let registry = ProbeProtocol::registry();
        let payload = Bytes::from_static(&[9, 1, 2, 3, 4]);
        let result = decode_frame(&registry, PeerId::new(0), payload);
        assert!(matches!(result, Err(Error::UnknownTypeId { .. })));
    }

    #[test]
    fn test_decode_frame_rejects_truncated_fields() {
        let registry = ProbeProtocol::registry();
        let payload = Bytes::from_static(&[0, 42]);
        let result = decode_frame(&registry, PeerId::new(0), payload);
        assert!(matches!(result, Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_decode_frame_rejects_empty_frame() {
        let registry = ProbeProtocol::registry();
        let result = decode_frame(&registry, PeerId::new(0), Bytes::new());
        assert!(matches!(result, Err(Error::UnexpectedEof { .. })));
    }
}

//! Lock-protected hand-off buffer between the poll thread and the consumer

use std::sync::Mutex;

use crate::protocol::MessageTypeId;
use crate::transport::PeerId;

/// A decoded message paired with its peer and wire type identifier.
///
/// Created on the poll thread when a frame decodes, consumed exactly once
/// when the consumer drains the mailbox, never mutated in between.
#[derive(Debug)]
pub struct Envelope<P> {
    /// The decoded message value.
    pub message: P,
    /// Peer the frame arrived from.
    pub peer: PeerId,
    /// Wire type identifier read from the frame's leading byte.
    pub type_id: MessageTypeId,
}

/// Two-buffer mailbox: the poll thread pushes into the accumulation buffer
/// under the lock; the consumer swaps it against its own reused drain
/// buffer, so the lock is never held while handlers run.
#[derive(Debug)]
pub(crate) struct Mailbox<P> {
    inbound: Mutex<Vec<Envelope<P>>>,
}

impl<P> Mailbox<P> {
    pub(crate) fn new() -> Self {
        Self {
            inbound: Mutex::new(Vec::new()),
        }
    }

    /// Queue an envelope for the next drain cycle. Poll-thread side.
    pub(crate) fn push(&self, envelope: Envelope<P>) {
        self.inbound
            .lock()
            .expect("mailbox mutex poisoned")
            .push(envelope);
    }

    /// Swap accumulated envelopes into `drain`, leaving the (cleared)
    /// drain allocation as the next accumulation buffer. Consumer side.
    pub(crate) fn drain_into(&self, drain: &mut Vec<Envelope<P>>) {
        drain.clear();
        let mut inbound = self.inbound.lock().expect("mailbox mutex poisoned");
        std::mem::swap(&mut *inbound, drain);
    }

    /// Discard everything not yet drained.
    pub(crate) fn clear(&self) {
        self.inbound.lock().expect("mailbox mutex poisoned").clear();
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.inbound.lock().expect("mailbox mutex poisoned").len()
    }
}

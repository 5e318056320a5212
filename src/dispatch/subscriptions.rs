//! Per-type ordered multicast subscriber lists

use std::collections::HashMap;

use crate::protocol::MessageTypeId;
use crate::transport::PeerId;

use super::Envelope;

/// Token identifying one registered handler.
///
/// Returned by subscribe operations; closures have no identity of their
/// own, so removal goes through the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    type_id: MessageTypeId,
    token: u64,
}

impl SubscriptionId {
    /// Wire type the subscription listens to.
    #[must_use]
    pub fn type_id(self) -> MessageTypeId {
        self.type_id
    }
}

pub(crate) type Handler<P> = Box<dyn FnMut(&P, PeerId) + Send>;

struct HandlerEntry<P> {
    token: u64,
    handler: Handler<P>,
}

/// Subscription registry: one ordered handler list per message type id.
///
/// An entry is created on the first subscribe for a type and removed when
/// its last handler goes, so dispatch never walks empty entries. Mutated
/// from the consumer thread only — no internal locking.
pub(crate) struct Subscriptions<P> {
    entries: HashMap<MessageTypeId, Vec<HandlerEntry<P>>>,
    next_token: u64,
}

impl<P> Subscriptions<P> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_token: 0,
        }
    }

    /// Append a handler to the entry for `type_id`, creating the entry if
    /// absent.
    pub(crate) fn add(&mut self, type_id: MessageTypeId, handler: Handler<P>) -> SubscriptionId {
        let token = self.next_token;
        self.next_token += 1;
        self.entries
            .entry(type_id)
            .or_default()
            .push(HandlerEntry { token, handler });
        SubscriptionId { type_id, token }
    }

    /// Remove the handler behind `id`; drops the whole entry when it
    /// becomes empty. Returns whether a handler was actually removed.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let Some(handlers) = self.entries.get_mut(&id.type_id) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|entry| entry.token != id.token);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            self.entries.remove(&id.type_id);
        }
        removed
    }

    /// Fan an envelope out to the entry matching its type id, in
    /// subscription order. Returns the number of handlers invoked; zero
    /// means the envelope had no audience.
    pub(crate) fn dispatch(&mut self, envelope: &Envelope<P>) -> usize {
        let Some(handlers) = self.entries.get_mut(&envelope.type_id) else {
            return 0;
        };
        for entry in handlers.iter_mut() {
            (entry.handler)(&envelope.message, envelope.peer);
        }
        handlers.len()
    }

    /// Drop every entry. Used at session teardown.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether an entry exists for `type_id`.
    #[cfg(test)]
    pub(crate) fn has_entry(&self, type_id: MessageTypeId) -> bool {
        self.entries.contains_key(&type_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    const PING: MessageTypeId = MessageTypeId::new(0);
    const PONG: MessageTypeId = MessageTypeId::new(1);

    fn envelope(type_id: MessageTypeId, message: u8) -> Envelope<u8> {
        Envelope {
            message,
            peer: PeerId::new(7),
            type_id,
        }
    }

    fn recording_handler(log: &Arc<Mutex<Vec<String>>>, label: &str) -> Handler<u8> {
        let log = Arc::clone(log);
        let label = label.to_string();
        Box::new(move |message, _peer| {
            log.lock().unwrap().push(format!("{label}:{message}"));
        })
    }

    #[test]
    fn test_dispatch_invokes_handlers_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscriptions::new();
        subs.add(PING, recording_handler(&log, "first"));
        subs.add(PING, recording_handler(&log, "second"));

        let invoked = subs.dispatch(&envelope(PING, 9));
        assert_eq!(invoked, 2);
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["first:9".to_string(), "second:9".to_string()]
        );
    }

    #[test]
    fn test_dispatch_is_scoped_to_the_type_id() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscriptions::new();
        subs.add(PING, recording_handler(&log, "ping"));

        let invoked = subs.dispatch(&envelope(PONG, 3));
        assert_eq!(invoked, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_reports_whether_a_handler_was_present() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscriptions::new();
        let id = subs.add(PING, recording_handler(&log, "ping"));

        assert!(subs.remove(id));
        assert!(!subs.remove(id));
    }

    #[test]
    fn test_last_removal_drops_the_entry() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscriptions::new();
        let first = subs.add(PING, recording_handler(&log, "a"));
        let second = subs.add(PING, recording_handler(&log, "b"));
        assert!(subs.has_entry(PING));

        subs.remove(first);
        assert!(subs.has_entry(PING));
        subs.remove(second);
        assert!(!subs.has_entry(PING));

        // Dispatch after full unsubscribe is a quiet no-op.
        assert_eq!(subs.dispatch(&envelope(PING, 1)), 0);
    }

    #[test]
    fn test_remaining_handler_survives_sibling_removal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscriptions::new();
        let first = subs.add(PING, recording_handler(&log, "a"));
        subs.add(PING, recording_handler(&log, "b"));

        subs.remove(first);
        subs.dispatch(&envelope(PING, 5));
        assert_eq!(log.lock().unwrap().as_slice(), ["b:5".to_string()]);
    }

    #[test]
    fn test_clear_drops_every_entry() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscriptions::new();
        subs.add(PING, recording_handler(&log, "a"));
        subs.add(PONG, recording_handler(&log, "b"));

        subs.clear();
        assert!(!subs.has_entry(PING));
        assert!(!subs.has_entry(PONG));
    }

    #[test]
    fn test_tokens_stay_unique_across_types() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscriptions::new();
        let ping = subs.add(PING, recording_handler(&log, "a"));
        let pong = subs.add(PONG, recording_handler(&log, "b"));
        assert_ne!(ping, pong);
        assert_eq!(ping.type_id(), PING);
        assert_eq!(pong.type_id(), PONG);
    }
}

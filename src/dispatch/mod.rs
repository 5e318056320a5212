//! Dispatch pipeline: mailbox hand-off and typed subscriber fan-out
//!
//! The poll thread decodes frames and pushes [`Envelope`]s into the
//! mailbox; the consumer thread drains them during `update()` and fans
//! each one out to the subscribers registered for its message type.
//! Envelopes with no audience are dropped silently.

mod mailbox;
mod subscriptions;

pub use mailbox::Envelope;
pub use subscriptions::SubscriptionId;

pub(crate) use mailbox::Mailbox;
pub(crate) use subscriptions::{Handler, Subscriptions};

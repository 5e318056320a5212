//! Protocol core: wire codec, message traits, and the type registry
//!
//! This module provides the wire format primitives, the codec capability
//! traits, and the runtime registry that maps message types to the 1-byte
//! identifiers leading every frame:
//!
//! ```text
//! [1 byte: MessageTypeId] [field_1] [field_2] ... [field_n]
//! ```

mod error;
mod message;
mod registry;
mod wire;

pub use error::{Error, Result};
pub use message::{Message, Value};
pub use registry::{MessageRegistry, MessageTypeId, Variant};
pub use wire::{FrameReader, FrameWriter};

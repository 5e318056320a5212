//! Protocol-layer error types

use thiserror::Error;

use super::MessageTypeId;

/// Errors raised by the wire codec and the type registry
#[derive(Error, Debug)]
pub enum Error {
    /// Message type was never registered
    #[error("message type {name} is not registered")]
    UnknownType {
        /// Full name of the unregistered Rust type
        name: &'static str,
    },

    /// Wire identifier does not name a registered type
    #[error("message type id {id} is not registered")]
    UnknownTypeId {
        /// Identifier read from the wire
        id: MessageTypeId,
    },

    /// Identifier space is exhausted
    #[error("message registry is full ({capacity} types)")]
    RegistryFull {
        /// Maximum number of registrable types
        capacity: usize,
    },

    /// Frame ended before a field could be read
    #[error("unexpected end of frame: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the next field requires
        needed: usize,
        /// Bytes left in the frame
        remaining: usize,
    },

    /// String exceeds the wire length prefix
    #[error("string too long for the wire: {len} bytes (max {max})")]
    StringTooLong {
        /// Byte length of the offending string
        len: usize,
        /// Maximum encodable byte length
        max: usize,
    },

    /// Char does not fit a single UTF-16 code unit
    #[error("char {ch:?} does not fit a single utf-16 code unit")]
    CharNotEncodable {
        /// Offending char
        ch: char,
    },

    /// Wire code unit is not a valid char
    #[error("invalid utf-16 code unit {unit:#06x} on the wire")]
    InvalidChar {
        /// Offending code unit
        unit: u16,
    },

    /// String bytes are not valid UTF-8
    #[error("invalid UTF-8 on the wire: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

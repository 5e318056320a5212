//! Runtime type registry and the protocol-declaring macro
//!
//! Every message type a session speaks gets a dense 1-byte identifier,
//! assigned in registration order starting at 0. The mapping is stable
//! within a process run only — both ends must register the same types in
//! the same order, which is what the [`protocol!`](crate::protocol!) macro
//! guarantees by generating the registration list from one declaration.

use std::any::TypeId as RustTypeId;
use std::collections::HashMap;
use std::fmt;

use super::{Error, Message, Result};

/// Dense 1-byte identifier naming a message's wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageTypeId(u8);

impl MessageTypeId {
    /// Number of distinct message types a process can register.
    pub const CAPACITY: usize = 256;

    /// Wrap a raw identifier byte.
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The identifier byte as written to the wire.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The identifier as a table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MessageTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential identifier allocator.
///
/// Hands out ids from 0 upward and never recycles: protocol types are
/// registered once for the life of the process.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    /// Allocate the next identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryFull`] once all 256 ids are taken.
    pub(crate) fn alloc(&mut self) -> Result<MessageTypeId> {
        if self.next >= MessageTypeId::CAPACITY {
            return Err(Error::RegistryFull {
                capacity: MessageTypeId::CAPACITY,
            });
        }
        let id = MessageTypeId(self.next as u8);
        self.next += 1;
        Ok(id)
    }
}

/// Membership of a concrete message type in a protocol sum type.
///
/// Implementations are generated by [`protocol!`](crate::protocol!) for
/// every listed message type.
pub trait Variant<P>: Message + Default + Send + 'static {
    /// Wrap the concrete message into the protocol sum type.
    fn wrap(self) -> P;

    /// Borrow the concrete message back out of the protocol sum type.
    fn peel(protocol: &P) -> Option<&Self>;
}

struct Entry<P> {
    name: &'static str,
    blank: fn() -> P,
}

fn blank_of<P, M: Variant<P>>() -> P {
    M::default().wrap()
}

/// Runtime registry mapping message types to dense wire identifiers.
///
/// Registration order determines the id mapping; use the generated
/// `registry()` constructor of a [`protocol!`](crate::protocol!) enum so
/// both ends of a connection agree on it.
pub struct MessageRegistry<P> {
    ids: HashMap<RustTypeId, MessageTypeId>,
    entries: Vec<Entry<P>>,
    allocator: IdAllocator,
}

impl<P> MessageRegistry<P> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            entries: Vec::new(),
            allocator: IdAllocator::default(),
        }
    }

    /// Register a message type, assigning the next free identifier.
    ///
    /// Registering a type that is already present is a no-op returning its
    /// existing identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryFull`] when the identifier space is
    /// exhausted — a startup-time failure the embedding application should
    /// treat as fatal.
    pub fn register<M: Variant<P>>(&mut self) -> Result<MessageTypeId> {
        let key = RustTypeId::of::<M>();
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        let id = self.allocator.alloc()?;
        self.ids.insert(key, id);
        self.entries.push(Entry {
            name: std::any::type_name::<M>(),
            blank: blank_of::<P, M>,
        });
        Ok(id)
    }

    /// Look up the identifier assigned to a message type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when the type was never registered.
    pub fn id_of<M: Variant<P>>(&self) -> Result<MessageTypeId> {
        self.ids
            .get(&RustTypeId::of::<M>())
            .copied()
            .ok_or(Error::UnknownType {
                name: std::any::type_name::<M>(),
            })
    }

    /// Construct a blank message for an identifier, ready for decoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTypeId`] when the identifier names no
    /// registered type.
    pub fn blank(&self, id: MessageTypeId) -> Result<P> {
        let entry = self
            .entries
            .get(id.index())
            .ok_or(Error::UnknownTypeId { id })?;
        Ok((entry.blank)())
    }

    /// Full Rust name of the type behind an identifier, if registered.
    #[must_use]
    pub fn type_name(&self, id: MessageTypeId) -> Option<&'static str> {
        self.entries.get(id.index()).map(|entry| entry.name)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> Default for MessageRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for MessageRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRegistry")
            .field(
                "types",
                &self.entries.iter().map(|e| e.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Declare a protocol: the closed set of message types a session speaks.
///
/// Expands to the protocol sum type (one variant per listed message type),
/// a [`Message`] impl delegating to the active variant,
/// [`Variant`] impls for every listed type, and a `registry()` constructor
/// that registers the types in declaration order — the declaration is the
/// discovery order, so identical declarations on both ends yield identical
/// id mappings. Listing more than 256 types fails at compile time.
///
/// ```rust
/// use courier::{message, protocol};
///
/// message! {
///     pub struct PingMessage {
///         pub sequence: u32,
///     }
/// }
///
/// message! {
///     pub struct PongMessage {
///         pub sequence: u32,
///     }
/// }
///
/// protocol! {
///     /// Messages spoken by the ping-pong demo.
///     pub enum PingPongProtocol {
///         PingMessage,
///         PongMessage,
///     }
/// }
///
/// let registry = PingPongProtocol::registry();
/// assert_eq!(registry.id_of::<PingMessage>().unwrap().raw(), 0);
/// assert_eq!(registry.id_of::<PongMessage>().unwrap().raw(), 1);
/// ```
#[macro_export]
macro_rules! protocol {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $ty:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $(
                #[doc = ::core::concat!("A decoded [`", ::core::stringify!($ty), "`].")]
                $ty($ty),
            )+
        }

        impl $crate::protocol::Message for $name {
            fn encode(
                &self,
                writer: &mut $crate::protocol::FrameWriter,
            ) -> $crate::protocol::Result<()> {
                match self {
                    $( Self::$ty(message) => $crate::protocol::Message::encode(message, writer), )+
                }
            }

            fn decode(
                &mut self,
                reader: &mut $crate::protocol::FrameReader,
            ) -> $crate::protocol::Result<()> {
                match self {
                    $( Self::$ty(message) => $crate::protocol::Message::decode(message, reader), )+
                }
            }
        }

        $(
            impl $crate::protocol::Variant<$name> for $ty {
                fn wrap(self) -> $name {
                    $name::$ty(self)
                }

                #[allow(unreachable_patterns)]
                fn peel(protocol: &$name) -> ::core::option::Option<&Self> {
                    match protocol {
                        $name::$ty(message) => ::core::option::Option::Some(message),
                        _ => ::core::option::Option::None,
                    }
                }
            }
        )+

        impl $name {
            /// Registry with every protocol message registered in
            /// declaration order.
            #[must_use]
            $vis fn registry() -> $crate::protocol::MessageRegistry<$name> {
                const _: () = ::core::assert!(
                    [$( ::core::stringify!($ty) ),+].len() <= 256,
                    "a protocol enumerates at most 256 message types",
                );
                let mut registry = $crate::protocol::MessageRegistry::new();
                $(
                    registry
                        .register::<$ty>()
                        .expect("variant count checked at compile time");
                )+
                registry
            }
        }
    };
}

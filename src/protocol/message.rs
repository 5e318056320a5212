//! Message codec traits and the codec-generating macro
//!
//! A message is a plain value with an ordered field list. Its codec is
//! derived at compile time by [`message!`](crate::message): fields are
//! written and read in declaration order at fixed widths, with no schema on
//! the wire. Nested message fields recurse through the same machinery via
//! the [`Value`] trait.

use super::wire::{FrameReader, FrameWriter};
use super::Result;

/// Codec capability of a protocol message.
///
/// Encoding and decoding must visit the same fields in the same order;
/// there is nothing on the wire to detect a mismatch. Implementations are
/// generated by [`message!`](crate::message) — hand-written impls are
/// possible but must uphold the same symmetry.
pub trait Message {
    /// Append this message's fields to the frame.
    fn encode(&self, writer: &mut FrameWriter) -> Result<()>;

    /// Populate this message's fields from the frame.
    fn decode(&mut self, reader: &mut FrameReader) -> Result<()>;
}

/// Field-level wire capability.
///
/// Implemented for every supported primitive and, via
/// [`message!`](crate::message), for every generated message type, which is
/// what lets messages nest as fields of other messages.
pub trait Value: Sized {
    /// Write this value to the frame.
    fn put(&self, writer: &mut FrameWriter) -> Result<()>;

    /// Read a value of this type from the frame.
    fn take(reader: &mut FrameReader) -> Result<Self>;
}

macro_rules! primitive_value {
    ($($ty:ty => $put:ident / $take:ident),* $(,)?) => {
        $(
            impl Value for $ty {
                fn put(&self, writer: &mut FrameWriter) -> Result<()> {
                    writer.$put(*self);
                    Ok(())
                }

                fn take(reader: &mut FrameReader) -> Result<Self> {
                    reader.$take()
                }
            }
        )*
    };
}

primitive_value! {
    bool => put_bool / take_bool,
    u8 => put_u8 / take_u8,
    i8 => put_i8 / take_i8,
    u16 => put_u16 / take_u16,
    i16 => put_i16 / take_i16,
    u32 => put_u32 / take_u32,
    i32 => put_i32 / take_i32,
    u64 => put_u64 / take_u64,
    i64 => put_i64 / take_i64,
    f32 => put_f32 / take_f32,
    f64 => put_f64 / take_f64,
}

impl Value for String {
    fn put(&self, writer: &mut FrameWriter) -> Result<()> {
        writer.put_str(self)
    }

    fn take(reader: &mut FrameReader) -> Result<Self> {
        reader.take_str()
    }
}

impl Value for char {
    fn put(&self, writer: &mut FrameWriter) -> Result<()> {
        writer.put_char(*self)
    }

    fn take(reader: &mut FrameReader) -> Result<Self> {
        reader.take_char()
    }
}

/// Declare a protocol message and derive its wire codec.
///
/// Expands a struct declaration into the struct itself (with `Debug`,
/// `Clone`, `Default` and `PartialEq` derives) plus [`Message`] and
/// [`Value`] impls that encode and decode the fields in declaration order.
/// Field types may be any supported primitive or another `message!` type.
///
/// ```rust
/// use courier::message;
///
/// message! {
///     /// Ping probe carrying a sequence counter.
///     pub struct PingMessage {
///         pub sequence: u32,
///     }
/// }
///
/// let ping = PingMessage { sequence: 42 };
/// let mut writer = courier::FrameWriter::new();
/// courier::Message::encode(&ping, &mut writer).unwrap();
/// assert_eq!(writer.as_slice(), &[42, 0, 0, 0]);
/// ```
#[macro_export]
macro_rules! message {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::protocol::Message for $name {
            #[allow(unused_variables)]
            fn encode(
                &self,
                writer: &mut $crate::protocol::FrameWriter,
            ) -> $crate::protocol::Result<()> {
                $( $crate::protocol::Value::put(&self.$field, writer)?; )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn decode(
                &mut self,
                reader: &mut $crate::protocol::FrameReader,
            ) -> $crate::protocol::Result<()> {
                $( self.$field = $crate::protocol::Value::take(reader)?; )*
                Ok(())
            }
        }

        impl $crate::protocol::Value for $name {
            fn put(
                &self,
                writer: &mut $crate::protocol::FrameWriter,
            ) -> $crate::protocol::Result<()> {
                $crate::protocol::Message::encode(self, writer)
            }

            fn take(
                reader: &mut $crate::protocol::FrameReader,
            ) -> $crate::protocol::Result<Self> {
                let mut value = <Self as ::core::default::Default>::default();
                $crate::protocol::Message::decode(&mut value, reader)?;
                Ok(value)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::protocol::Error;

    crate::message! {
        /// Every supported primitive in one message.
        struct KitchenSinkMessage {
            flag: bool,
            tiny: u8,
            small: i16,
            medium: u32,
            large: i64,
            ratio: f32,
            precise: f64,
            label: String,
            initial: char,
        }
    }

    crate::message! {
        struct PositionMessage {
            x: f32,
            y: f32,
        }
    }

    crate::message! {
        struct MoveMessage {
            position: PositionMessage,
            speed: f32,
        }
    }

    crate::message! {
        struct EmptyMessage {}
    }

    fn roundtrip<M: Message + Default>(original: &M) -> M {
        let mut writer = FrameWriter::new();
        original.encode(&mut writer).unwrap();
        let mut decoded = M::default();
        let mut reader = FrameReader::new(Bytes::copy_from_slice(writer.as_slice()));
        decoded.decode(&mut reader).unwrap();
        assert!(reader.is_empty(), "codec must consume the whole frame");
        decoded
    }

    #[test]
    fn test_all_primitives_roundtrip() {
        let original = KitchenSinkMessage {
            flag: true,
            tiny: u8::MAX,
            small: i16::MIN,
            medium: 0,
            large: -1,
            ratio: 0.5,
            precise: f64::MAX,
            label: "snapshot".to_string(),
            initial: 'é',
        };
        assert_eq!(roundtrip(&original), original);
    }

    #[test]
    fn test_fields_encode_in_declaration_order() {
        let message = PositionMessage { x: 1.0, y: -1.0 };
        let mut writer = FrameWriter::new();
        message.encode(&mut writer).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1.0f32.to_le_bytes());
        expected.extend_from_slice(&(-1.0f32).to_le_bytes());
        assert_eq!(writer.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_nested_message_roundtrip() {
        let original = MoveMessage {
            position: PositionMessage { x: 3.0, y: 4.0 },
            speed: 5.0,
        };
        assert_eq!(roundtrip(&original), original);
    }

    #[test]
    fn test_nested_message_is_inlined_on_the_wire() {
        let message = MoveMessage {
            position: PositionMessage { x: 3.0, y: 4.0 },
            speed: 5.0,
        };
        let mut writer = FrameWriter::new();
        message.encode(&mut writer).unwrap();
        // No framing around the nested value: 3 floats back to back.
        assert_eq!(writer.len(), 12);
    }

    #[test]
    fn test_empty_message_encodes_nothing() {
        let message = EmptyMessage::default();
        assert_eq!(roundtrip(&message), message);

        let mut writer = FrameWriter::new();
        message.encode(&mut writer).unwrap();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_truncated_frame_surfaces_eof() {
        let message = PositionMessage { x: 1.0, y: 2.0 };
        let mut writer = FrameWriter::new();
        message.encode(&mut writer).unwrap();

        let truncated = Bytes::copy_from_slice(&writer.as_slice()[..5]);
        let mut decoded = PositionMessage::default();
        let result = decoded.decode(&mut FrameReader::new(truncated));
        assert!(matches!(result, Err(Error::UnexpectedEof { .. })));
    }

    // Property-based tests
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn kitchen_sink_strategy() -> impl Strategy<Value = KitchenSinkMessage> {
            (
                any::<bool>(),
                any::<u8>(),
                any::<i16>(),
                any::<u32>(),
                any::<i64>(),
                any::<f32>().prop_filter("comparable", |v| !v.is_nan()),
                any::<f64>().prop_filter("comparable", |v| !v.is_nan()),
                any::<String>(),
                any::<char>().prop_filter("single code unit", |c| c.len_utf16() == 1),
            )
                .prop_map(
                    |(flag, tiny, small, medium, large, ratio, precise, label, initial)| {
                        KitchenSinkMessage {
                            flag,
                            tiny,
                            small,
                            medium,
                            large,
                            ratio,
                            precise,
                            label,
                            initial,
                        }
                    },
                )
        }

        proptest! {
            #[test]
            fn prop_message_roundtrip(original in kitchen_sink_strategy()) {
                prop_assert_eq!(roundtrip(&original), original);
            }

            #[test]
            fn prop_encoding_is_deterministic(original in kitchen_sink_strategy()) {
                let mut first = FrameWriter::new();
                original.encode(&mut first).unwrap();
                let mut second = FrameWriter::new();
                original.encode(&mut second).unwrap();
                prop_assert_eq!(first.as_slice(), second.as_slice());
            }
        }
    }
}

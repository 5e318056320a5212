//! Little-endian wire reader/writer
//!
//! All multi-byte primitives travel little-endian at fixed widths. Strings
//! carry a `u16` byte-length prefix followed by UTF-8 bytes; chars travel as
//! one UTF-16 code unit (2 bytes). There is no length prefix and no checksum
//! on the frame itself — both ends must run identical codecs.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Error, Result};

/// Default capacity for a freshly created frame writer.
const DEFAULT_FRAME_CAPACITY: usize = 256;

/// Growable frame writer for outgoing messages.
///
/// A session keeps one writer behind its send lock and calls [`reset`]
/// before every frame, reusing the allocation across sends.
///
/// [`reset`]: FrameWriter::reset
#[derive(Debug)]
pub struct FrameWriter {
    buf: BytesMut,
}

impl FrameWriter {
    /// Create a writer with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FRAME_CAPACITY)
    }

    /// Create a writer with an explicit initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Clear the buffer, keeping its allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write a bool as one byte (0 or 1).
    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Write an unsigned 8-bit integer.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Write a signed 8-bit integer.
    pub fn put_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    /// Write an unsigned 16-bit integer.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    /// Write a signed 16-bit integer.
    pub fn put_i16(&mut self, value: i16) {
        self.buf.put_i16_le(value);
    }

    /// Write an unsigned 32-bit integer.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    /// Write a signed 32-bit integer.
    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    /// Write an unsigned 64-bit integer.
    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    /// Write a signed 64-bit integer.
    pub fn put_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    /// Write a 32-bit float.
    pub fn put_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    /// Write a 64-bit float.
    pub fn put_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    /// Write a string as a `u16` byte-length prefix plus UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StringTooLong`] when the UTF-8 byte length exceeds
    /// `u16::MAX`.
    pub fn put_str(&mut self, value: &str) -> Result<()> {
        let len = value.len();
        if len > usize::from(u16::MAX) {
            return Err(Error::StringTooLong {
                len,
                max: usize::from(u16::MAX),
            });
        }
        self.buf.put_u16_le(len as u16);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    /// Write a char as a single UTF-16 code unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CharNotEncodable`] for chars outside the Basic
    /// Multilingual Plane.
    pub fn put_char(&mut self, value: char) -> Result<()> {
        if value.len_utf16() != 1 {
            return Err(Error::CharNotEncodable { ch: value });
        }
        let mut units = [0u16; 1];
        value.encode_utf16(&mut units);
        self.buf.put_u16_le(units[0]);
        Ok(())
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Consuming frame reader for inbound messages.
///
/// Every read checks the remaining byte count first and fails with
/// [`Error::UnexpectedEof`] instead of panicking on a short frame.
#[derive(Debug)]
pub struct FrameReader {
    buf: Bytes,
}

impl FrameReader {
    /// Wrap a received frame for reading.
    #[must_use]
    pub fn new(frame: Bytes) -> Self {
        Self { buf: frame }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Check whether the frame is fully consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn need(&self, needed: usize) -> Result<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(Error::UnexpectedEof { needed, remaining });
        }
        Ok(())
    }

    /// Read a bool; any nonzero byte is `true`.
    pub fn take_bool(&mut self) -> Result<bool> {
        Ok(self.take_u8()? != 0)
    }

    /// Read an unsigned 8-bit integer.
    pub fn take_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    /// Read a signed 8-bit integer.
    pub fn take_i8(&mut self) -> Result<i8> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    /// Read an unsigned 16-bit integer.
    pub fn take_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.buf.get_u16_le())
    }

    /// Read a signed 16-bit integer.
    pub fn take_i16(&mut self) -> Result<i16> {
        self.need(2)?;
        Ok(self.buf.get_i16_le())
    }

    /// Read an unsigned 32-bit integer.
    pub fn take_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    /// Read a signed 32-bit integer.
    pub fn take_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32_le())
    }

    /// Read an unsigned 64-bit integer.
    pub fn take_u64(&mut self) -> Result<u64> {
        self.need(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Read a signed 64-bit integer.
    pub fn take_i64(&mut self) -> Result<i64> {
        self.need(8)?;
        Ok(self.buf.get_i64_le())
    }

    /// Read a 32-bit float.
    pub fn take_f32(&mut self) -> Result<f32> {
        self.need(4)?;
        Ok(self.buf.get_f32_le())
    }

    /// Read a 64-bit float.
    pub fn take_f64(&mut self) -> Result<f64> {
        self.need(8)?;
        Ok(self.buf.get_f64_le())
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn take_str(&mut self) -> Result<String> {
        let len = usize::from(self.take_u16()?);
        self.need(len)?;
        let bytes = self.buf.copy_to_bytes(len);
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Read a char from a single UTF-16 code unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChar`] for surrogate code units.
    pub fn take_char(&mut self) -> Result<char> {
        let unit = self.take_u16()?;
        char::from_u32(u32::from(unit)).ok_or(Error::InvalidChar { unit })
    }
}

use bytes::{Buf, Bytes};

use crate::error::{Result, WireError};

/// Bounds-checked sequential reader over one message body.
///
/// Every read checks [`remaining`](Self::remaining) first, so running off
/// the end yields [`WireError::Truncated`] instead of a panic.
#[derive(Debug, Clone, Default)]
pub struct ByteSource {
    buf: Bytes,
}

impl ByteSource {
    /// Create a source over the given bytes.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    /// Read exactly `len` bytes (zero-copy).
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Consume and return everything that is left.
    pub fn read_rest(&mut self) -> Bytes {
        std::mem::take(&mut self.buf)
    }

    /// Consume the source and return the unread bytes.
    pub fn into_inner(self) -> Bytes {
        self.buf
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(WireError::Truncated {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }
}

impl From<Bytes> for ByteSource {
    fn from(buf: Bytes) -> Self {
        Self::new(buf)
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(buf: Vec<u8>) -> Self {
        Self::new(buf)
    }
}

impl From<&'static [u8]> for ByteSource {
    fn from(buf: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(buf))
    }
}

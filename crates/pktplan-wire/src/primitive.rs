//! Fixed encodings for the primitive field kinds.
//!
//! Integers are fixed-width little-endian. Text carries a 7-bit
//! variable-length byte count followed by UTF-8. Raw tail bytes carry no
//! prefix and, on read, take whatever is left in the message body.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::source::ByteSource;

/// Largest byte count a text length prefix may carry.
pub const MAX_TEXT_LEN: usize = i32::MAX as usize;

/// The closed set of primitive field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    I32,
    I16,
    U16,
    U8,
    Bool,
    Text,
    RawTail,
}

impl PrimitiveKind {
    /// Short name used in diagnostics and listings.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Text => "text",
            PrimitiveKind::RawTail => "raw-tail",
        }
    }

    /// Encoded width for fixed-size kinds, `None` for text and raw tail.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            PrimitiveKind::I32 => Some(4),
            PrimitiveKind::I16 | PrimitiveKind::U16 => Some(2),
            PrimitiveKind::U8 | PrimitiveKind::Bool => Some(1),
            PrimitiveKind::Text | PrimitiveKind::RawTail => None,
        }
    }
}

/// A fixed-width scalar with a wire encoding.
pub trait Primitive: Copy + Send + Sync + 'static {
    const KIND: PrimitiveKind;

    fn put(self, dst: &mut BytesMut);

    fn get(src: &mut ByteSource) -> Result<Self>;
}

impl Primitive for i32 {
    const KIND: PrimitiveKind = PrimitiveKind::I32;

    fn put(self, dst: &mut BytesMut) {
        dst.put_i32_le(self);
    }

    fn get(src: &mut ByteSource) -> Result<Self> {
        src.read_i32_le()
    }
}

impl Primitive for i16 {
    const KIND: PrimitiveKind = PrimitiveKind::I16;

    fn put(self, dst: &mut BytesMut) {
        dst.put_i16_le(self);
    }

    fn get(src: &mut ByteSource) -> Result<Self> {
        src.read_i16_le()
    }
}

impl Primitive for u16 {
    const KIND: PrimitiveKind = PrimitiveKind::U16;

    fn put(self, dst: &mut BytesMut) {
        dst.put_u16_le(self);
    }

    fn get(src: &mut ByteSource) -> Result<Self> {
        src.read_u16_le()
    }
}

impl Primitive for u8 {
    const KIND: PrimitiveKind = PrimitiveKind::U8;

    fn put(self, dst: &mut BytesMut) {
        dst.put_u8(self);
    }

    fn get(src: &mut ByteSource) -> Result<Self> {
        src.read_u8()
    }
}

impl Primitive for bool {
    const KIND: PrimitiveKind = PrimitiveKind::Bool;

    fn put(self, dst: &mut BytesMut) {
        dst.put_u8(u8::from(self));
    }

    // Any non-zero byte reads as true.
    fn get(src: &mut ByteSource) -> Result<Self> {
        Ok(src.read_u8()? != 0)
    }
}

/// Write `value` as 7-bit groups, low group first, high bit = continuation.
pub fn put_var_u32(mut value: u32, dst: &mut BytesMut) {
    while value >= 0x80 {
        dst.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Read a 7-bit variable-length integer (at most five bytes).
pub fn get_var_u32(src: &mut ByteSource) -> Result<u32> {
    let mut value = 0u32;
    for group in 0..5 {
        let byte = src.read_u8()?;
        if group == 4 && byte > 0x0F {
            return Err(WireError::MalformedLength);
        }
        value |= u32::from(byte & 0x7F) << (7 * group);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(WireError::MalformedLength)
}

/// Write length-prefixed UTF-8 text.
pub fn put_text(value: &str, dst: &mut BytesMut) -> Result<()> {
    if value.len() > MAX_TEXT_LEN {
        return Err(WireError::TextTooLong(value.len()));
    }
    dst.reserve(text_len(value));
    put_var_u32(value.len() as u32, dst);
    dst.put_slice(value.as_bytes());
    Ok(())
}

/// Read length-prefixed UTF-8 text.
pub fn get_text(src: &mut ByteSource) -> Result<String> {
    let len = get_var_u32(src)? as usize;
    if len > MAX_TEXT_LEN {
        return Err(WireError::TextTooLong(len));
    }
    let raw = src.read_bytes(len)?;
    Ok(std::str::from_utf8(&raw)?.to_owned())
}

/// Encoded size of `value` as text, prefix included.
pub fn text_len(value: &str) -> usize {
    let mut prefix = 1;
    let mut len = value.len() >> 7;
    while len > 0 {
        prefix += 1;
        len >>= 7;
    }
    prefix + value.len()
}

/// Write raw tail bytes verbatim.
pub fn put_raw(value: &[u8], dst: &mut BytesMut) {
    dst.put_slice(value);
}

/// Read raw tail bytes: everything left in the source.
pub fn get_raw(src: &mut ByteSource) -> Bytes {
    src.read_rest()
}

//! Primitive wire encodings and pluggable custom codecs.
//!
//! Everything here is byte-level and packet-agnostic:
//! - Fixed-width little-endian integers and booleans
//! - 7-bit length-prefixed UTF-8 text
//! - Raw tail bytes that consume the rest of a message body
//! - A [`CustomCodec`] capability for every other field type, collected
//!   in a [`CodecTable`] keyed by value type

pub mod custom;
pub mod error;
pub mod primitive;
pub mod source;

pub use custom::{CodecTable, CustomCodec, EnumCodec, ErasedCodec};
pub use error::{Result, WireError};
pub use primitive::{
    get_raw, get_text, get_var_u32, put_raw, put_text, put_var_u32, text_len, Primitive,
    PrimitiveKind,
};
pub use source::ByteSource;

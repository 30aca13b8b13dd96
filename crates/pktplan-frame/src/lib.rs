//! Length-prefixed packet envelopes.
//!
//! Every packet on the wire is wrapped as:
//! - A 2-byte little-endian total length, counting the length field itself
//! - A 1-byte outer message identifier
//! - A 2-byte little-endian module identifier, only when the outer
//!   identifier is the configured multiplexed id
//!
//! The rest of the frame is the packet body. This crate knows nothing about
//! packet types; it only cuts and assembles frames.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::EnvelopeCodec;
pub use codec::{
    decode_frame, encode_frame, encode_raw, split_frame, FrameConfig, FrameHeader, RawFrame,
    LENGTH_SIZE, MAX_FRAME_SIZE, MODULE_ID_SIZE, MULTIPLEXED_ID,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Size of the length prefix.
pub const LENGTH_SIZE: usize = 2;

/// Size of the module identifier carried by multiplexed frames.
pub const MODULE_ID_SIZE: usize = 2;

/// Default outer identifier shared by all module packets.
pub const MULTIPLEXED_ID: u8 = 82;

/// Largest frame a 2-byte length prefix can describe.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Identifiers at the front of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Outer message identifier.
    pub message_id: u8,
    /// Module identifier, present only on multiplexed frames.
    pub module_id: Option<u16>,
}

impl FrameHeader {
    /// Header of a top-level message.
    pub fn message(message_id: u8) -> Self {
        Self {
            message_id,
            module_id: None,
        }
    }

    /// Header of a module packet under the multiplexed outer id.
    pub fn module(multiplexed_id: u8, module_id: u16) -> Self {
        Self {
            message_id: multiplexed_id,
            module_id: Some(module_id),
        }
    }

    /// Encoded size of the header, length prefix included.
    pub fn encoded_len(&self) -> usize {
        let module = if self.module_id.is_some() {
            MODULE_ID_SIZE
        } else {
            0
        };
        LENGTH_SIZE + 1 + module
    }
}

/// A frame cut from the wire, with its body still undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub header: FrameHeader,
    pub body: Bytes,
}

impl RawFrame {
    pub fn new(header: FrameHeader, body: impl Into<Bytes>) -> Self {
        Self {
            header,
            body: body.into(),
        }
    }

    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        self.header.encoded_len() + self.body.len()
    }
}

/// Configuration shared by the encoder and decoder.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Outer identifier followed by a module identifier. Default: 82.
    pub multiplexed_id: u8,
    /// Maximum frame size in bytes, capped at [`MAX_FRAME_SIZE`].
    ///
    /// A larger frame fails with [`FrameError::FrameTooLarge`].
    /// [`split_frame`] drops it when it is fully buffered, so the next frame
    /// stays reachable. [`decode_frame`] leaves the stream at the bad frame.
    pub max_frame_size: usize,
}

impl FrameConfig {
    fn limit(&self) -> usize {
        self.max_frame_size.min(MAX_FRAME_SIZE)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            multiplexed_id: MULTIPLEXED_ID,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

/// Append one frame to `dst`, with the body produced by `write_body`.
///
/// Wire format:
/// ```text
/// ┌─────────────┬──────────┬──────────────┬──────────────────┐
/// │ Length      │ Outer id │ Module id    │ Body             │
/// │ (2B LE)     │ (1B)     │ (2B LE, only │ (Length - header │
/// │ incl. self  │          │ multiplexed) │  bytes)          │
/// └─────────────┴──────────┴──────────────┴──────────────────┘
/// ```
///
/// The length is patched in once the body is written. On any error `dst` is
/// truncated back to where it started. Returns the frame size.
pub fn encode_frame<E, F>(
    header: FrameHeader,
    config: &FrameConfig,
    dst: &mut BytesMut,
    write_body: F,
) -> std::result::Result<usize, E>
where
    E: From<FrameError>,
    F: FnOnce(&mut BytesMut) -> std::result::Result<(), E>,
{
    let start = dst.len();
    let result = write_envelope(header, config, dst, start, write_body);
    if result.is_err() {
        dst.truncate(start);
    }
    result
}

fn write_envelope<E, F>(
    header: FrameHeader,
    config: &FrameConfig,
    dst: &mut BytesMut,
    start: usize,
    write_body: F,
) -> std::result::Result<usize, E>
where
    E: From<FrameError>,
    F: FnOnce(&mut BytesMut) -> std::result::Result<(), E>,
{
    dst.reserve(header.encoded_len());
    dst.put_u16_le(0);
    dst.put_u8(header.message_id);
    if let Some(module_id) = header.module_id {
        dst.put_u16_le(module_id);
    }

    write_body(dst)?;

    let size = dst.len() - start;
    let max = config.limit();
    if size > max {
        return Err(FrameError::FrameTooLarge { size, max }.into());
    }
    dst[start..start + LENGTH_SIZE].copy_from_slice(&(size as u16).to_le_bytes());
    Ok(size)
}

/// Encode a frame whose body is already in hand.
pub fn encode_raw(frame: &RawFrame, config: &FrameConfig, dst: &mut BytesMut) -> Result<usize> {
    encode_frame(frame.header, config, dst, |dst: &mut BytesMut| {
        dst.put_slice(&frame.body);
        Ok(())
    })
}

/// Decode a frame from a streaming buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly the frame's bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<RawFrame>> {
    if src.len() < LENGTH_SIZE {
        return Ok(None); // Need more data
    }

    let len = usize::from(u16::from_le_bytes([src[0], src[1]]));
    check_length(len, config)?;

    if src.len() < len {
        return Ok(None); // Need more data
    }

    let frame = src.split_to(len).freeze();
    parse_frame(frame, config).map(Some)
}

/// Cut the next frame from a buffer that should already hold it completely.
///
/// Bytes after the frame stay in `src`. A frame over the configured limit
/// is consumed before the error is returned, if `src` holds all of it.
pub fn split_frame(src: &mut Bytes, config: &FrameConfig) -> Result<RawFrame> {
    if src.len() < LENGTH_SIZE {
        return Err(FrameError::Truncated {
            needed: LENGTH_SIZE,
            remaining: src.len(),
        });
    }

    let len = usize::from(u16::from_le_bytes([src[0], src[1]]));
    if let Err(err) = check_length(len, config) {
        if matches!(err, FrameError::FrameTooLarge { .. }) && src.len() >= len {
            src.advance(len);
        }
        return Err(err);
    }

    if src.len() < len {
        return Err(FrameError::Truncated {
            needed: len,
            remaining: src.len(),
        });
    }

    parse_frame(src.split_to(len), config)
}

fn check_length(len: usize, config: &FrameConfig) -> Result<()> {
    if len < LENGTH_SIZE + 1 {
        return Err(FrameError::InvalidLength(len));
    }
    let max = config.limit();
    if len > max {
        return Err(FrameError::FrameTooLarge { size: len, max });
    }
    Ok(())
}

// `frame` is exactly one frame, length prefix included.
fn parse_frame(mut frame: Bytes, config: &FrameConfig) -> Result<RawFrame> {
    let len = frame.len();
    frame.advance(LENGTH_SIZE);
    let message_id = frame.get_u8();

    let module_id = if message_id == config.multiplexed_id {
        if frame.len() < MODULE_ID_SIZE {
            return Err(FrameError::InvalidLength(len));
        }
        Some(frame.get_u16_le())
    } else {
        None
    };

    Ok(RawFrame {
        header: FrameHeader {
            message_id,
            module_id,
        },
        body: frame,
    })
}

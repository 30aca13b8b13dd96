//! `tokio_util::codec` adapter for envelope frames.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_raw, FrameConfig, RawFrame};
use crate::error::FrameError;

/// Cuts a byte stream into [`RawFrame`]s and writes them back out.
///
/// Use with `FramedRead`, `FramedWrite` or `Framed`.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeCodec {
    config: FrameConfig,
}

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for EnvelopeCodec {
    type Item = RawFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RawFrame>, FrameError> {
        decode_frame(src, &self.config)
    }
}

impl Encoder<RawFrame> for EnvelopeCodec {
    type Error = FrameError;

    fn encode(&mut self, item: RawFrame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_raw(&item, &self.config, dst).map(|_| ())
    }
}

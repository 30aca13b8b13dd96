use pktplan_frame::FrameConfig;

/// Controls envelope layout and decode strictness.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Multiplexed outer id and frame size limit.
    pub frame: FrameConfig,
    /// When true, body bytes left after the last field fail the decode
    /// with `CodecError::TrailingBytes` instead of being ignored.
    pub strict_trailing_bytes: bool,
}

impl RegistryConfig {
    /// Outer identifier reserved for module packets.
    pub fn multiplexed_id(&self) -> u8 {
        self.frame.multiplexed_id
    }
}

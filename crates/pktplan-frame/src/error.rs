/// Errors that can occur while cutting or assembling frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The length prefix is too small for the header it announces.
    #[error("invalid frame length {0}")]
    InvalidLength(usize),

    /// The frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A complete buffer ended before the frame did.
    #[error("truncated frame ({needed} bytes needed, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

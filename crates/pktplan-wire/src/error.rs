/// Errors that can occur while reading or writing wire values.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The buffer ended before the value was complete.
    #[error("unexpected end of buffer ({needed} bytes needed, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// A variable-length integer ran past five bytes or overflowed.
    #[error("malformed 7-bit length prefix")]
    MalformedLength,

    /// Text bytes are not valid UTF-8.
    #[error("text is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    /// Text is longer than the length prefix can express.
    #[error("text too long ({0} bytes)")]
    TextTooLong(usize),

    /// A raw value has no matching enum variant.
    #[error("invalid {type_name} value: {value}")]
    InvalidEnum { type_name: &'static str, value: i64 },

    /// A type-erased value did not have the expected type.
    #[error("value type mismatch (expected {expected})")]
    TypeMismatch { expected: &'static str },

    /// A codec is already registered for this value type.
    #[error("custom codec already registered for {0}")]
    DuplicateCodec(&'static str),

    /// Failure reported by a custom codec.
    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, WireError>;

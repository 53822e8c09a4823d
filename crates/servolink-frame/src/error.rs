/// Errors that can occur while framing or encoding commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// More payload bytes arrived than the frame buffer holds; the excess was dropped.
    #[error("frame overflowed {capacity}-byte buffer ({dropped} bytes dropped)")]
    BufferOverflow { capacity: usize, dropped: usize },

    /// An encoded frame would not fit the receiver's buffer.
    #[error("encoded frame too long ({size} bytes, max {max})")]
    FrameTooLong { size: usize, max: usize },

    /// A command name cannot be put on the wire.
    #[error("invalid command name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The framing configuration is inconsistent.
    #[error("invalid frame config: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended. `partial` is set when a frame had been started.
    #[error("connection closed (unterminated frame: {partial})")]
    ConnectionClosed { partial: bool },
}

impl FrameError {
    /// True when the error is a read timeout rather than a broken link.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err) if matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        )
    }
}

/// Reasons a completed frame could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    /// The frame had no name token. This is the `MissingField` case where
    /// nothing at all was supplied: callers that only care about short input
    /// can treat both the same way.
    #[error("empty frame")]
    EmptyFrame,

    /// Fewer than the required number of integer fields were present.
    #[error("missing field {index} (frame has {found} of {expected} fields)")]
    MissingField {
        index: usize,
        found: usize,
        expected: usize,
    },

    /// Strict mode: a field is not a plain decimal integer.
    #[error("field {index} is not an integer: {token:?}")]
    InvalidField { index: usize, token: String },

    /// Strict mode: more tokens than name + fields.
    #[error("unexpected extra fields ({count} tokens, expected {expected})")]
    UnexpectedField { count: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

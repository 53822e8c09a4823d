/// Errors raised by dispatch collaborators.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The actuator refused or failed the move.
    #[error("actuator failed: {0}")]
    Actuator(String),

    /// A position is outside what the actuator accepts.
    #[error("joint {joint} position {value} outside {min}..={max}")]
    OutOfRange {
        joint: usize,
        value: i32,
        min: i32,
        max: i32,
    },

    /// Writing the report back to the sender failed.
    #[error("report failed: {0}")]
    Report(#[from] std::io::Error),
}

/// Errors that end a receive loop.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] servolink_transport::TransportError),

    /// Frame-level error (I/O on the byte source).
    #[error("frame error: {0}")]
    Frame(#[from] servolink_frame::FrameError),

    /// The receiver configuration is unusable.
    #[error("invalid receiver config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

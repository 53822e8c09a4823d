use std::fmt;
use std::io;

use servolink_dispatch::ReceiveError;
use servolink_frame::FrameError;
use servolink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::InvalidBaudRate(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => {
            let message = format!("{context}: {other}");
            let code = match other.into_io().kind() {
                io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
                _ => TRANSPORT_ERROR,
            };
            CliError::new(code, message)
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::InvalidName { .. }
        | FrameError::FrameTooLong { .. }
        | FrameError::BufferOverflow { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::ConnectionClosed { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn receive_error(context: &str, err: ReceiveError) -> CliError {
    match err {
        ReceiveError::Transport(err) => transport_error(context, err),
        ReceiveError::Frame(err) => frame_error(context, err),
        ReceiveError::Config(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_map_to_timeout_code() {
        let err = frame_error(
            "read failed",
            FrameError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")),
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("read failed: "));
    }

    #[test]
    fn bad_frames_are_data_invalid() {
        let err = frame_error("send failed", FrameError::FrameTooLong { size: 40, max: 31 });
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn config_errors_are_usage() {
        assert_eq!(
            receive_error("listen", ReceiveError::Config("capacity".into())).code,
            USAGE
        );
        assert_eq!(
            transport_error("open", TransportError::InvalidBaudRate(0)).code,
            USAGE
        );
    }

    #[test]
    fn closed_link_is_failure() {
        let err = receive_error(
            "listen",
            ReceiveError::Frame(FrameError::ConnectionClosed { partial: true }),
        );
        assert_eq!(err.code, FAILURE);
    }
}

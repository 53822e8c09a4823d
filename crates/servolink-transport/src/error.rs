use std::path::PathBuf;

/// Errors that can occur in link transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: serialport::Error,
    },

    /// The serial driver rejected a setting.
    #[error("failed to configure serial port: {0}")]
    Configure(serialport::Error),

    /// Port enumeration failed.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// The requested baud rate is not usable.
    #[error("invalid baud rate {0}")]
    InvalidBaudRate(u32),

    /// An I/O error occurred on the link stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Best-effort conversion into an `io::Error`, preserving the kind where one exists.
    pub fn into_io(self) -> std::io::Error {
        match self {
            TransportError::Io(io) => io,
            TransportError::Open { source, .. }
            | TransportError::Configure(source)
            | TransportError::Enumerate(source) => source.into(),
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

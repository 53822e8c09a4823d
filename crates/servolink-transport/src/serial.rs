use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Baud rate the receiver firmware listens on.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default blocking read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Serial line settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed in bits per second. Default: 9600.
    pub baud_rate: u32,
    /// Read timeout for blocking reads. Default: 2 s.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Serial port transport (8N1, no flow control).
pub struct SerialLink;

impl SerialLink {
    /// Open a serial device with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<LinkStream> {
        Self::open_with_config(path, &SerialConfig::default())
    }

    /// Open a serial device with explicit settings.
    pub fn open_with_config(path: impl AsRef<Path>, config: &SerialConfig) -> Result<LinkStream> {
        let path = path.as_ref();
        if config.baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(config.baud_rate));
        }

        let port = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        info!(?path, baud = config.baud_rate, "opened serial port");
        Ok(LinkStream::from_serial(port))
    }
}

/// Names of serial ports visible to the system.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

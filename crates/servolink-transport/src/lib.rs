//! Byte transport for the servolink protocol.
//!
//! The protocol itself only needs an ordered byte stream. This crate provides
//! the [`LinkStream`] type over:
//! - serial ports (USB CDC, UART adapters) via `serialport`
//! - Unix stream pairs (loopback for tests and local tooling)
//!
//! Everything above this layer works with any `Read`/`Write` stream.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{available_ports, SerialConfig, SerialLink, DEFAULT_BAUD_RATE};
pub use traits::LinkStream;

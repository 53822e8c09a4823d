use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode, encode_command};
use crate::config::{FrameConfig, FIELD_COUNT};
use crate::error::{FrameError, Result};
use crate::tokenizer::ParsedCommand;

/// Writes framed commands to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> CommandWriter<T> {
    /// Create a new command writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new command writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.capacity + 1),
            config,
        }
    }

    /// Write a complete command frame (blocking).
    pub fn write_command(&mut self, command: &ParsedCommand) -> Result<()> {
        self.buf.clear();
        encode(command, &self.config, &mut self.buf)?;
        self.write_buffered()
    }

    /// Encode and send a name and its fields.
    pub fn send(&mut self, name: &str, fields: &[i32; FIELD_COUNT]) -> Result<()> {
        self.buf.clear();
        encode_command(name, fields, &self.config, &mut self.buf)?;
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed { partial: offset > 0 }),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

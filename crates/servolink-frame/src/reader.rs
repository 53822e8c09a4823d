use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::accumulator::{AccumulatorState, FrameAccumulator, RawFrame};
use crate::config::FrameConfig;
use crate::error::{FrameError, Result};

// Serial links deliver a few bytes per read; keep reads small.
const READ_CHUNK_SIZE: usize = 64;

/// Reads complete frames from any `Read` stream.
///
/// Bytes that arrive after an end marker stay queued until the next call, so
/// only one frame is handed out at a time. A read timeout surfaces as
/// `FrameError::Io` and leaves any partial frame in place; calling
/// `read_frame` again resumes it.
pub struct FrameReader<T> {
    inner: T,
    accumulator: FrameAccumulator,
    pending: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            accumulator: FrameAccumulator::with_config(&config),
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<RawFrame> {
        loop {
            if !self.pending.is_empty() {
                let (consumed, frame) = self.accumulator.push(&self.pending);
                self.pending.advance(consumed);
                if let Some(frame) = frame {
                    return Ok(frame);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed {
                    partial: self.accumulator.is_collecting(),
                });
            }

            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    /// Accumulator state (partial frame tracking).
    pub fn state(&self) -> AccumulatorState {
        self.accumulator.state()
    }

    /// Drop any partial frame and queued bytes.
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.pending.clear();
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

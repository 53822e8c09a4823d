use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::config::{FrameConfig, MIN_CAPACITY};
use crate::error::{FrameError, Result};

/// Where the accumulator is in the frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a start marker; everything else is dropped.
    Idle,
    /// Inside a frame, storing payload bytes.
    Collecting,
}

/// Snapshot of the accumulator's persistent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorState {
    pub phase: Phase,
    pub write_index: usize,
}

impl AccumulatorState {
    /// The state before the first start marker and after every completed frame.
    pub const IDLE: Self = Self {
        phase: Phase::Idle,
        write_index: 0,
    };
}

/// The payload of one completed frame, markers excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    payload: Bytes,
    overflow: usize,
    capacity: usize,
}

impl RawFrame {
    /// Build a frame from payload bytes that fit the buffer.
    pub fn new(payload: impl Into<Bytes>, capacity: usize) -> Self {
        Self {
            payload: payload.into(),
            overflow: 0,
            capacity,
        }
    }

    /// Payload bytes as received (possibly truncated).
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Payload bytes as a cheap clone of the snapshot.
    pub fn payload(&self) -> Bytes {
        self.payload.clone()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Number of payload bytes that did not fit and were dropped.
    pub fn overflow(&self) -> usize {
        self.overflow
    }

    pub fn is_truncated(&self) -> bool {
        self.overflow > 0
    }

    /// Buffer capacity the frame was collected with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `Err(BufferOverflow)` if bytes were dropped while collecting this frame.
    pub fn check_overflow(&self) -> Result<()> {
        if self.overflow == 0 {
            Ok(())
        } else {
            Err(FrameError::BufferOverflow {
                capacity: self.capacity,
                dropped: self.overflow,
            })
        }
    }
}

/// Reassembles start/end-marker delimited frames from a byte stream.
///
/// Bytes are offered one at a time; state persists between calls so a frame
/// may arrive across any number of reads. The buffer holds `capacity - 1`
/// payload bytes. Once the write index reaches that slot it stops advancing
/// and later bytes land in the terminator slot, which the end marker then
/// overwrites: the frame keeps its first `capacity - 1` bytes and reports
/// how many were dropped.
#[derive(Debug)]
pub struct FrameAccumulator {
    buf: BytesMut,
    phase: Phase,
    write_index: usize,
    dropped: usize,
    capacity: usize,
    start_marker: u8,
    end_marker: u8,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAccumulator {
    /// Accumulator with the default markers and a 32-byte buffer.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        let capacity = config.capacity.max(MIN_CAPACITY);
        Self {
            buf: BytesMut::with_capacity(capacity),
            phase: Phase::Idle,
            write_index: 0,
            dropped: 0,
            capacity,
            start_marker: config.start_marker,
            end_marker: config.end_marker,
        }
    }

    /// Consume one byte; returns the frame when `byte` closes one.
    pub fn feed(&mut self, byte: u8) -> Option<RawFrame> {
        match self.phase {
            Phase::Idle => {
                if byte == self.start_marker {
                    self.begin();
                } else {
                    trace!(byte, "discarding byte outside frame");
                }
                None
            }
            Phase::Collecting if byte == self.end_marker => Some(self.finish()),
            Phase::Collecting => {
                self.store(byte);
                None
            }
        }
    }

    /// Feed bytes until a frame completes.
    ///
    /// Returns how many bytes of `bytes` were consumed. Bytes after the end
    /// marker are left for the caller so only one frame is in flight.
    pub fn push(&mut self, bytes: &[u8]) -> (usize, Option<RawFrame>) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(frame) = self.feed(byte) {
                return (i + 1, Some(frame));
            }
        }
        (bytes.len(), None)
    }

    /// Abandon any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.phase = Phase::Idle;
        self.write_index = 0;
        self.dropped = 0;
    }

    pub fn state(&self) -> AccumulatorState {
        AccumulatorState {
            phase: self.phase,
            write_index: self.write_index,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.phase == Phase::Collecting
    }

    /// Bytes stored so far in the frame being collected.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn begin(&mut self) {
        self.buf.clear();
        self.phase = Phase::Collecting;
        self.write_index = 0;
        self.dropped = 0;
        debug!("frame start");
    }

    fn store(&mut self, byte: u8) {
        let last = self.capacity - 1;
        if self.write_index < last {
            self.buf.extend_from_slice(&[byte]);
            self.write_index += 1;
            return;
        }

        // Index is clamped on the terminator slot.
        if self.dropped == 0 {
            warn!(capacity = self.capacity, "frame overflow, truncating");
        }
        self.dropped += 1;
    }

    fn finish(&mut self) -> RawFrame {
        let frame = RawFrame {
            payload: Bytes::copy_from_slice(&self.buf),
            overflow: self.dropped,
            capacity: self.capacity,
        };
        debug!(
            len = frame.len(),
            overflow = frame.overflow,
            "frame complete"
        );
        self.reset();
        frame
    }
}

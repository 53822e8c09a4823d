use crate::error::{FrameError, Result};

/// Frame buffer size in bytes, terminator slot included.
pub const DEFAULT_CAPACITY: usize = 32;

/// Smallest usable buffer: one payload byte plus the terminator slot.
pub const MIN_CAPACITY: usize = 2;

/// Byte that opens a frame.
pub const START_MARKER: u8 = b'<';

/// Byte that closes a frame.
pub const END_MARKER: u8 = b'>';

/// Byte separating the name and the fields.
pub const DELIMITER: u8 = b',';

/// Number of integer fields after the command name.
pub const FIELD_COUNT: usize = 6;

/// How field tokens are converted to integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Leading digits win, no digits means 0, trailing junk is ignored.
    #[default]
    Permissive,
    /// Every field must be a whole decimal integer; extra fields are rejected.
    Strict,
}

/// Configuration shared by the accumulator, tokenizer and encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Buffer capacity including the terminator slot. Default: 32.
    pub capacity: usize,
    /// Frame start byte. Default: `<`.
    pub start_marker: u8,
    /// Frame end byte. Default: `>`.
    pub end_marker: u8,
    /// Field separator. Default: `,`.
    pub delimiter: u8,
    /// Longest command name kept by the tokenizer, in bytes. Default: 31.
    pub name_capacity: usize,
    /// Integer conversion policy. Default: permissive.
    pub parse_mode: ParseMode,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            start_marker: START_MARKER,
            end_marker: END_MARKER,
            delimiter: DELIMITER,
            name_capacity: DEFAULT_CAPACITY - 1,
            parse_mode: ParseMode::Permissive,
        }
    }
}

impl FrameConfig {
    /// Config with a different buffer capacity; the name capacity follows it.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            name_capacity: capacity.saturating_sub(1),
            ..Self::default()
        }
    }

    /// Most payload bytes a frame can carry.
    pub fn max_payload(&self) -> usize {
        self.capacity.saturating_sub(1)
    }

    /// Check that markers and sizes do not conflict.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < MIN_CAPACITY {
            return Err(FrameError::InvalidConfig(format!(
                "capacity {} is below minimum {MIN_CAPACITY}",
                self.capacity
            )));
        }
        if self.start_marker == self.end_marker {
            return Err(FrameError::InvalidConfig(
                "start and end markers must differ".to_string(),
            ));
        }
        if self.delimiter == self.start_marker || self.delimiter == self.end_marker {
            return Err(FrameError::InvalidConfig(
                "delimiter must differ from the markers".to_string(),
            ));
        }
        if self.name_capacity == 0 {
            return Err(FrameError::InvalidConfig(
                "name capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

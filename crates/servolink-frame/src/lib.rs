//! Start/end-marker framing for the servolink command protocol.
//!
//! Every command travels as one line of ASCII between two markers:
//! - `<` opens a frame, `>` closes it (neither can be escaped)
//! - the payload is a command name and six integers separated by `,`
//!
//! The [`FrameAccumulator`] reassembles frames from a byte stream into a
//! bounded buffer and the [`FieldTokenizer`] turns each one into a
//! [`ParsedCommand`].

pub mod accumulator;
#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod config;
pub mod error;
pub mod reader;
pub mod tokenizer;
pub mod writer;

pub use accumulator::{AccumulatorState, FrameAccumulator, Phase, RawFrame};
#[cfg(feature = "async")]
pub use async_codec::CommandCodec;
pub use codec::{encode, encode_command};
pub use config::{
    FrameConfig, ParseMode, DEFAULT_CAPACITY, DELIMITER, END_MARKER, FIELD_COUNT, START_MARKER,
};
pub use error::{FrameError, Result, TokenizeError};
pub use reader::FrameReader;
pub use tokenizer::{leading_int, tokenize, FieldTokenizer, ParsedCommand};
pub use writer::CommandWriter;

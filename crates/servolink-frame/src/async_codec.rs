//! `tokio_util::codec` adapter over the accumulator and encoder.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::accumulator::{FrameAccumulator, RawFrame};
use crate::codec::encode;
use crate::config::FrameConfig;
use crate::error::FrameError;
use crate::tokenizer::ParsedCommand;

/// Decodes [`RawFrame`]s and encodes [`ParsedCommand`]s.
///
/// Decoding yields raw frames so callers decide how to tokenize and how to
/// treat overflowed frames, the same as the blocking reader.
#[derive(Debug)]
pub struct CommandCodec {
    accumulator: FrameAccumulator,
    config: FrameConfig,
}

impl CommandCodec {
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            accumulator: FrameAccumulator::with_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CommandCodec {
    type Item = RawFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RawFrame>, FrameError> {
        let (consumed, frame) = self.accumulator.push(src);
        src.advance(consumed);
        Ok(frame)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<RawFrame>, FrameError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if self.accumulator.is_collecting() {
            return Err(FrameError::ConnectionClosed { partial: true });
        }
        Ok(None)
    }
}

impl Encoder<&ParsedCommand> for CommandCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &ParsedCommand, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode(item, &self.config, dst)
    }
}

impl Encoder<ParsedCommand> for CommandCodec {
    type Error = FrameError;

    fn encode(&mut self, item: ParsedCommand, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode(&item, &self.config, dst)
    }
}

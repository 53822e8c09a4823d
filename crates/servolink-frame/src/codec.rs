use bytes::{BufMut, BytesMut};

use crate::config::{FrameConfig, FIELD_COUNT};
use crate::error::{FrameError, Result};
use crate::tokenizer::ParsedCommand;

/// Encode a command into the wire format.
///
/// Wire format:
/// ```text
/// <NAME,i1,i2,i3,i4,i5,i6>
/// ```
/// The payload between the markers must fit the receiver's buffer
/// (`capacity - 1` bytes), otherwise the receiver would truncate it.
pub fn encode_command(
    name: &str,
    fields: &[i32; FIELD_COUNT],
    config: &FrameConfig,
    dst: &mut BytesMut,
) -> Result<()> {
    validate_name(name, config)?;

    let mut payload = String::with_capacity(config.capacity);
    payload.push_str(name);
    for value in fields {
        payload.push(config.delimiter as char);
        payload.push_str(&value.to_string());
    }

    if payload.len() > config.max_payload() {
        return Err(FrameError::FrameTooLong {
            size: payload.len(),
            max: config.max_payload(),
        });
    }

    dst.reserve(payload.len() + 2);
    dst.put_u8(config.start_marker);
    dst.put_slice(payload.as_bytes());
    dst.put_u8(config.end_marker);
    Ok(())
}

/// Encode a [`ParsedCommand`].
pub fn encode(command: &ParsedCommand, config: &FrameConfig, dst: &mut BytesMut) -> Result<()> {
    encode_command(&command.name, &command.fields, config, dst)
}

fn validate_name(name: &str, config: &FrameConfig) -> Result<()> {
    let reject = |reason| {
        Err(FrameError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("name is empty");
    }
    if name.len() > config.name_capacity {
        return reject("name exceeds receiver name capacity");
    }
    if name
        .bytes()
        .any(|b| b == config.start_marker || b == config.end_marker)
    {
        return reject("name contains a frame marker");
    }
    if name.bytes().any(|b| b == config.delimiter) {
        return reject("name contains the field delimiter");
    }
    Ok(())
}

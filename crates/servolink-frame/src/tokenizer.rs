use tracing::debug;

use crate::accumulator::RawFrame;
use crate::config::{FrameConfig, ParseMode, FIELD_COUNT};
use crate::error::TokenizeError;

/// A command name and its six integer parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedCommand {
    pub name: String,
    pub fields: [i32; FIELD_COUNT],
}

impl ParsedCommand {
    pub fn new(name: impl Into<String>, fields: [i32; FIELD_COUNT]) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Splits completed frames into a [`ParsedCommand`].
///
/// Tokens are runs of non-delimiter bytes: repeated, leading and trailing
/// delimiters never produce empty tokens. The first token is the name, the
/// next six are the fields. In strict mode an empty token between or after
/// the fields is an `InvalidField`.
#[derive(Debug, Clone)]
pub struct FieldTokenizer {
    delimiter: u8,
    name_capacity: usize,
    mode: ParseMode,
}

impl Default for FieldTokenizer {
    fn default() -> Self {
        Self::with_config(&FrameConfig::default())
    }
}

impl FieldTokenizer {
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            name_capacity: config.name_capacity.max(1),
            mode: config.parse_mode,
        }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn tokenize(&self, frame: &RawFrame) -> Result<ParsedCommand, TokenizeError> {
        self.tokenize_bytes(frame.as_bytes())
    }

    /// Tokenize a payload that did not come through an accumulator.
    pub fn tokenize_bytes(&self, payload: &[u8]) -> Result<ParsedCommand, TokenizeError> {
        let delimiter = self.delimiter;
        let strict = self.mode == ParseMode::Strict;
        // Strict mode keeps empty tokens so they fail as invalid fields.
        let mut tokens = payload
            .split(|&b| b == delimiter)
            .filter(|token| strict || !token.is_empty());

        let name_token = tokens
            .next()
            .filter(|token| !token.is_empty())
            .ok_or(TokenizeError::EmptyFrame)?;
        let name_len = name_token.len().min(self.name_capacity);
        let name = String::from_utf8_lossy(&name_token[..name_len]).into_owned();

        let mut fields = [0i32; FIELD_COUNT];
        for (index, slot) in fields.iter_mut().enumerate() {
            let token = tokens.next().ok_or(TokenizeError::MissingField {
                index,
                found: index,
                expected: FIELD_COUNT,
            })?;
            *slot = match self.mode {
                ParseMode::Permissive => parse_permissive(index, token),
                ParseMode::Strict => parse_strict(index, token)?,
            };
        }

        if strict {
            let extra: Vec<&[u8]> = tokens.collect();
            if let Some(offset) = extra.iter().position(|token| token.is_empty()) {
                return Err(TokenizeError::InvalidField {
                    index: FIELD_COUNT + offset,
                    token: String::new(),
                });
            }
            if !extra.is_empty() {
                return Err(TokenizeError::UnexpectedField {
                    count: 1 + FIELD_COUNT + extra.len(),
                    expected: 1 + FIELD_COUNT,
                });
            }
        }

        Ok(ParsedCommand { name, fields })
    }
}

/// Tokenize with the default delimiter and permissive numbers.
pub fn tokenize(frame: &RawFrame) -> Result<ParsedCommand, TokenizeError> {
    FieldTokenizer::default().tokenize(frame)
}

fn parse_permissive(index: usize, token: &[u8]) -> i32 {
    let value = leading_int(token);
    if value.is_none() {
        debug!(
            index,
            token = %String::from_utf8_lossy(token),
            "field has no leading digits, using 0"
        );
    }
    value.unwrap_or(0)
}

fn parse_strict(index: usize, token: &[u8]) -> Result<i32, TokenizeError> {
    let invalid = || TokenizeError::InvalidField {
        index,
        token: String::from_utf8_lossy(token).into_owned(),
    };
    std::str::from_utf8(token)
        .map_err(|_| invalid())?
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .parse::<i32>()
        .map_err(|_| invalid())
}

/// Leading integer of `token`: optional whitespace and sign, then digits.
///
/// Returns `None` when no digit follows. Values beyond `i32` saturate.
pub fn leading_int(token: &[u8]) -> Option<i32> {
    let mut rest = token;
    while let [b, tail @ ..] = rest {
        if is_c_space(*b) {
            rest = tail;
        } else {
            break;
        }
    }

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for &d in &rest[..digits] {
        value = value.saturating_mul(10).saturating_add(i64::from(d - b'0'));
        if value > i64::from(i32::MAX) + 1 {
            break;
        }
    }
    let value = if negative { -value } else { value };
    Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

// C `isspace`: space, \t, \n, \v, \f, \r.
fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::FrameAccumulator;

    fn frame(payload: &[u8]) -> RawFrame {
        RawFrame::new(payload.to_vec(), 32)
    }

    fn strict() -> FieldTokenizer {
        FieldTokenizer::with_config(&FrameConfig {
            parse_mode: ParseMode::Strict,
            ..FrameConfig::default()
        })
    }

    #[test]
    fn splits_name_and_six_fields() {
        let cmd = tokenize(&frame(b"Servo,10,20,30,40,50,60")).unwrap();
        assert_eq!(cmd, ParsedCommand::new("Servo", [10, 20, 30, 40, 50, 60]));
    }

    #[test]
    fn accepts_host_spacing_and_negatives() {
        let cmd = tokenize(&frame(b"Servo, 12, -22, 55, 77, 66, 33")).unwrap();
        assert_eq!(cmd.name, "Servo");
        assert_eq!(cmd.fields, [12, -22, 55, 77, 66, 33]);
    }

    #[test]
    fn short_frame_is_missing_field() {
        let err = tokenize(&frame(b"Servo,1,2,3")).unwrap_err();
        assert_eq!(
            err,
            TokenizeError::MissingField {
                index: 3,
                found: 3,
                expected: 6
            }
        );
    }

    #[test]
    fn name_only_is_missing_first_field() {
        let err = tokenize(&frame(b"Servo")).unwrap_err();
        assert!(matches!(err, TokenizeError::MissingField { index: 0, .. }));
    }

    #[test]
    fn empty_frames_are_rejected() {
        assert_eq!(tokenize(&frame(b"")).unwrap_err(), TokenizeError::EmptyFrame);
        assert_eq!(tokenize(&frame(b",,,")).unwrap_err(), TokenizeError::EmptyFrame);
    }

    #[test]
    fn empty_tokens_are_skipped() {
        let cmd = tokenize(&frame(b",Servo,,1,2,,3,4,5,6,")).unwrap();
        assert_eq!(cmd.fields, [1, 2, 3, 4, 5, 6]);

        let err = tokenize(&frame(b"Servo,1,,3,4,5")).unwrap_err();
        assert!(matches!(err, TokenizeError::MissingField { index: 4, .. }));
    }

    #[test]
    fn permissive_numbers_fall_back_to_zero() {
        let cmd = tokenize(&frame(b"Servo,abc,12abc,+7, x1,-,4")).unwrap();
        assert_eq!(cmd.fields, [0, 12, 7, 0, 0, 4]);
    }

    #[test]
    fn permissive_ignores_extra_tokens() {
        let cmd = tokenize(&frame(b"Servo,1,2,3,4,5,6,7,8")).unwrap();
        assert_eq!(cmd.fields, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn name_is_truncated_to_capacity() {
        let tok = FieldTokenizer::with_config(&FrameConfig {
            name_capacity: 4,
            ..FrameConfig::default()
        });
        let cmd = tok.tokenize_bytes(b"ServoDelay,1,2,3,4,5,6").unwrap();
        assert_eq!(cmd.name, "Serv");
    }

    #[test]
    fn leading_int_saturates() {
        assert_eq!(leading_int(b"99999999999"), Some(i32::MAX));
        assert_eq!(leading_int(b"-99999999999"), Some(i32::MIN));
        assert_eq!(leading_int(b"-2147483648"), Some(i32::MIN));
        assert_eq!(leading_int(b"\t\n 42"), Some(42));
        assert_eq!(leading_int(b"- 4"), None);
        assert_eq!(leading_int(b""), None);
    }

    #[test]
    fn strict_rejects_junk() {
        let err = strict().tokenize_bytes(b"Servo,1,2,3x,4,5,6").unwrap_err();
        assert_eq!(
            err,
            TokenizeError::InvalidField {
                index: 2,
                token: "3x".to_string()
            }
        );
    }

    #[test]
    fn strict_rejects_overflowing_values() {
        let err = strict()
            .tokenize_bytes(b"Servo,1,2,3,4,5,99999999999")
            .unwrap_err();
        assert!(matches!(err, TokenizeError::InvalidField { index: 5, .. }));
    }

    #[test]
    fn strict_rejects_extra_fields() {
        let err = strict().tokenize_bytes(b"Servo,1,2,3,4,5,6,7").unwrap_err();
        assert_eq!(
            err,
            TokenizeError::UnexpectedField {
                count: 8,
                expected: 7
            }
        );
    }

    #[test]
    fn strict_rejects_empty_field() {
        let err = strict().tokenize_bytes(b"Servo,1,,2,3,4,5,6").unwrap_err();
        assert_eq!(
            err,
            TokenizeError::InvalidField {
                index: 1,
                token: String::new()
            }
        );
    }

    #[test]
    fn strict_rejects_trailing_delimiter() {
        let err = strict().tokenize_bytes(b"Servo,1,2,3,4,5,6,").unwrap_err();
        assert_eq!(
            err,
            TokenizeError::InvalidField {
                index: 6,
                token: String::new()
            }
        );
    }

    #[test]
    fn strict_empty_name_is_empty_frame() {
        assert_eq!(strict().tokenize_bytes(b"").unwrap_err(), TokenizeError::EmptyFrame);
        assert_eq!(
            strict().tokenize_bytes(b",1,2,3,4,5,6").unwrap_err(),
            TokenizeError::EmptyFrame
        );
    }

    #[test]
    fn strict_accepts_padded_fields() {
        let cmd = strict().tokenize_bytes(b"Servo, 1, 2, 3, 4, 5, -6").unwrap();
        assert_eq!(cmd.fields, [1, 2, 3, 4, 5, -6]);
    }

    #[test]
    fn garbage_around_frame_yields_single_command() {
        let mut acc = FrameAccumulator::new();
        let commands: Vec<_> = b"garbage<Servo,10,20,30,40,50,60>next"
            .iter()
            .filter_map(|&b| acc.feed(b))
            .map(|f| tokenize(&f).unwrap())
            .collect();

        assert_eq!(
            commands,
            vec![ParsedCommand::new("Servo", [10, 20, 30, 40, 50, 60])]
        );
    }

    #[test]
    fn roundtrip_through_accumulator() {
        let cases: [(&str, [i32; FIELD_COUNT]); 3] = [
            ("Servo", [0, 15, 90, 180, 170, 73]),
            ("Arm", [-1, -2, -3, -4, -5, -6]),
            ("X", [2147483647, -2147483648, 0, 0, 0, 1]),
        ];
        for (name, fields) in cases {
            let config = FrameConfig::with_capacity(128);
            let mut acc = FrameAccumulator::with_config(&config);
            let wire = format!(
                "<{name},{},{},{},{},{},{}>",
                fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]
            );
            let (_, raw) = acc.push(wire.as_bytes());
            let cmd = FieldTokenizer::with_config(&config)
                .tokenize(&raw.unwrap())
                .unwrap();
            assert_eq!(cmd, ParsedCommand::new(name, fields));
        }
    }
}

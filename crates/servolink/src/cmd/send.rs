use std::io::{self, BufRead, BufReader};
use std::thread;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use servolink_frame::{CommandWriter, FrameConfig, FIELD_COUNT};
use servolink_transport::{SerialConfig, SerialLink};
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct SendOutput<'a> {
    port: String,
    name: &'a str,
    fields: [i32; FIELD_COUNT],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    echo: Vec<String>,
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let fields = parse_fields(&args.fields)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let settle = args.settle.as_deref().map(parse_duration).transpose()?;

    let config = FrameConfig::with_capacity(args.capacity);
    config
        .validate()
        .map_err(|err| CliError::new(USAGE, format!("--capacity: {err}")))?;

    let serial = SerialConfig {
        baud_rate: args.baud,
        read_timeout: wait_timeout,
    };
    let link = SerialLink::open_with_config(&args.port, &serial)
        .map_err(|err| transport_error("open failed", err))?;
    if let Some(settle) = settle {
        debug!(?settle, "waiting for the receiver to settle");
        thread::sleep(settle);
    }

    let mut writer = CommandWriter::with_config(link, config);
    writer
        .send(&args.name, &fields)
        .map_err(|err| frame_error("send failed", err))?;

    let echo = if args.wait {
        read_echo(writer.into_inner()).map_err(|err| io_error("receive failed", err))?
    } else {
        Vec::new()
    };

    print_sent(
        &SendOutput {
            port: args.port.display().to_string(),
            name: &args.name,
            fields,
            echo,
        },
        format,
    );
    Ok(SUCCESS)
}

fn parse_fields(values: &[i32]) -> CliResult<[i32; FIELD_COUNT]> {
    values.try_into().map_err(|_| {
        CliError::new(
            USAGE,
            format!(
                "--fields needs exactly {FIELD_COUNT} values, got {}",
                values.len()
            ),
        )
    })
}

/// Collect lines until the port stays quiet for one read timeout.
fn read_echo<R: io::Read>(source: R) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(source);
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let text = line.trim_end_matches(['\r', '\n']);
                if !text.is_empty() {
                    lines.push(text.to_string());
                }
            }
            Err(err) if matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                break
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(lines)
}

fn print_sent(out: &SendOutput<'_>, format: OutputFormat) {
    let fields = out
        .fields
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "FRAME", "ECHO"])
                .add_row(vec![
                    out.port.clone(),
                    format!("<{},{fields}>", out.name),
                    out.echo.join("\n"),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("sent <{},{fields}> to {}", out.name, out.port);
            for line in &out.echo {
                println!("  {line}");
            }
        }
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;

    struct QuietAfter {
        data: Cursor<Vec<u8>>,
    }

    impl Read for QuietAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::TimedOut, "quiet")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn fields_must_have_six_values() {
        assert_eq!(parse_fields(&[1, 2, 3, 4, 5, 6]).unwrap(), [1, 2, 3, 4, 5, 6]);
        let err = parse_fields(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("got 3"));
    }

    #[test]
    fn echo_stops_at_quiet_period() {
        let source = QuietAfter {
            data: Cursor::new(b"Command Servo\r\nDirection: 1 2 3 4 5 6\r\n\r\n".to_vec()),
        };
        assert_eq!(
            read_echo(source).unwrap(),
            vec!["Command Servo", "Direction: 1 2 3 4 5 6"]
        );
    }

    #[test]
    fn echo_stops_at_eof() {
        let lines = read_echo(Cursor::new(b"ready\r\n".to_vec())).unwrap();
        assert_eq!(lines, vec!["ready"]);
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
    }
}

mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "servolink",
    version,
    about = "Send, receive and inspect servolink command frames"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", env = "SERVOLINK_FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "SERVOLINK_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "SERVOLINK_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "servolink",
            "send",
            "/dev/ttyACM0",
            "--name",
            "Servo",
            "--fields",
            "90,-15,90,90,90,10",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.name, "Servo");
                assert_eq!(args.fields, vec![90, -15, 90, 90, 90, 10]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_listen_options() {
        let cli = Cli::try_parse_from([
            "servolink",
            "listen",
            "/dev/ttyUSB0",
            "--count",
            "3",
            "--strict",
            "--capacity",
            "64",
            "--baud",
            "115200",
            "--no-echo",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.count, Some(3));
                assert!(args.frame.strict);
                assert_eq!(args.frame.capacity, 64);
                assert_eq!(args.baud, 115_200);
                assert!(args.no_echo);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["servolink", "parse", "<a,1,2,3,4,5,6>", "--format", "json"])
            .expect("parse args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Parse(_)));
    }

    #[test]
    fn rejects_unknown_limit_policy() {
        let err = Cli::try_parse_from([
            "servolink",
            "listen",
            "/dev/ttyUSB0",
            "--limit-policy",
            "ignore",
        ])
        .expect_err("unknown policy should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn send_requires_fields() {
        let err = Cli::try_parse_from(["servolink", "send", "/dev/ttyACM0", "--name", "Servo"])
            .expect_err("missing fields should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}

use std::io::{Cursor, Read};
use std::sync::atomic::AtomicBool;

use servolink_dispatch::{
    DispatchConfig, NullReporter, Receiver, ReceiverConfig, ReceiverStats, RecordingActuator,
};
use servolink_frame::Phase;

use crate::cmd::ParseArgs;
use crate::exit::{io_error, receive_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_events, print_stats, EventOutput, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let input = if args.input == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|err| io_error("failed reading stdin", err))?;
        buf
    } else {
        args.input.clone().into_bytes()
    };

    let config = ReceiverConfig {
        frame: args.frame.frame_config()?,
        dispatch: DispatchConfig {
            echo: false,
            ..DispatchConfig::default()
        },
        reject_overflow: args.frame.reject_overflow,
        banner: None,
    };
    let report = parse_input(input, config)?;

    print_events(&report.events, format);
    print_stats(&report.stats, report.unterminated, format);

    if report.stats.rejected > 0 || report.unterminated {
        Ok(DATA_INVALID)
    } else {
        Ok(SUCCESS)
    }
}

struct ParseReport {
    events: Vec<EventOutput>,
    stats: ReceiverStats,
    unterminated: bool,
}

fn parse_input(input: Vec<u8>, config: ReceiverConfig) -> CliResult<ParseReport> {
    let mut receiver = Receiver::with_config(
        Cursor::new(input),
        RecordingActuator::new(),
        NullReporter,
        config,
    );

    let mut events = Vec::new();
    let stats = receiver
        .run_with(&AtomicBool::new(false), None, |event| {
            events.push(EventOutput::from(event))
        })
        .map_err(|err| receive_error("parse failed", err))?;

    Ok(ParseReport {
        events,
        stats,
        unterminated: receiver.reader().state().phase == Phase::Collecting,
    })
}

#[cfg(test)]
mod tests {
    use servolink_frame::{FrameConfig, ParseMode};

    use super::*;

    fn parse(input: &str) -> ParseReport {
        parse_input(input.as_bytes().to_vec(), ReceiverConfig::default()).unwrap()
    }

    #[test]
    fn garbage_around_frame_yields_one_command() {
        let report = parse("garbage<Servo,10,20,30,40,50,60>next");
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].name.as_deref(), Some("Servo"));
        assert_eq!(report.events[0].fields, Some([10, 20, 30, 40, 50, 60]));
        assert!(!report.unterminated);
    }

    #[test]
    fn short_frame_is_rejected() {
        let report = parse("<Servo,1,2,3>");
        assert_eq!(report.stats.rejected, 1);
        assert_eq!(report.events[0].event, "rejected");
    }

    #[test]
    fn trailing_open_frame_is_unterminated() {
        let report = parse("<a,1,2,3,4,5,6><b,1");
        assert_eq!(report.stats.dispatched, 1);
        assert!(report.unterminated);
    }

    #[test]
    fn strict_mode_rejects_junk_fields() {
        let config = ReceiverConfig {
            frame: FrameConfig {
                parse_mode: ParseMode::Strict,
                ..FrameConfig::default()
            },
            ..ReceiverConfig::default()
        };
        let report = parse_input(b"<Servo,1,2,x,4,5,6>".to_vec(), config).unwrap();
        assert_eq!(report.stats.rejected, 1);
    }
}

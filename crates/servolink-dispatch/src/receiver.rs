use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use servolink_frame::{
    FieldTokenizer, FrameConfig, FrameError, FrameReader, ParsedCommand, TokenizeError,
};
use servolink_transport::{LinkStream, SerialConfig, SerialLink};
use tracing::{debug, info, warn};

use crate::actuator::Actuator;
use crate::dispatcher::{DispatchConfig, Dispatcher};
use crate::error::{DispatchError, ReceiveError};
use crate::reporter::{EchoReporter, Reporter};

/// Usage line the firmware prints on boot.
pub const DEFAULT_BANNER: &str = "Enter data in this style <Servo, 12, 22, 55, 77, 66, 33>";

/// Receive-loop settings.
#[derive(Debug, Clone, Default)]
pub struct ReceiverConfig {
    pub frame: FrameConfig,
    pub dispatch: DispatchConfig,
    /// Drop frames that overflowed the buffer instead of tokenizing the
    /// truncated bytes. Default: false.
    pub reject_overflow: bool,
    /// Line announced once when `run` starts.
    pub banner: Option<String>,
}

/// Why a completed frame was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Tokenize(TokenizeError),
    Overflow { dropped: usize },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Tokenize(err) => write!(f, "{err}"),
            RejectReason::Overflow { dropped } => {
                write!(f, "frame overflowed buffer ({dropped} bytes dropped)")
            }
        }
    }
}

/// Outcome of one completed frame.
#[derive(Debug)]
pub enum ReceiveEvent {
    /// Parsed and handed to the actuator. `overflow` > 0 means the command
    /// came from a truncated frame.
    Dispatched {
        command: ParsedCommand,
        overflow: usize,
    },
    /// Frame dropped before dispatch.
    Rejected { reason: RejectReason },
    /// Parsed, but the actuator or reporter failed.
    DispatchFailed {
        command: ParsedCommand,
        error: DispatchError,
    },
}

/// Counters over the lifetime of a receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub frames: u64,
    pub dispatched: u64,
    pub rejected: u64,
    pub overflowed: u64,
    pub dispatch_failures: u64,
}

/// The driving loop: bytes in, one frame at a time, dispatch out.
///
/// Framing and tokenizing problems are reported as events and never stop
/// the loop. Only the byte source failing does.
pub struct Receiver<S, A, R> {
    reader: FrameReader<S>,
    tokenizer: FieldTokenizer,
    dispatcher: Dispatcher<A, R>,
    reject_overflow: bool,
    banner: Option<String>,
    stats: ReceiverStats,
}

impl<S: Read, A: Actuator, R: Reporter> Receiver<S, A, R> {
    pub fn new(source: S, actuator: A, reporter: R) -> Self {
        Self::with_config(source, actuator, reporter, ReceiverConfig::default())
    }

    pub fn with_config(source: S, actuator: A, reporter: R, config: ReceiverConfig) -> Self {
        Self {
            tokenizer: FieldTokenizer::with_config(&config.frame),
            reader: FrameReader::with_config(source, config.frame),
            dispatcher: Dispatcher::with_config(actuator, reporter, config.dispatch),
            reject_overflow: config.reject_overflow,
            banner: config.banner,
            stats: ReceiverStats::default(),
        }
    }

    /// Block until one frame completes and handle it.
    ///
    /// Errors come only from the byte source: I/O failures, read timeouts
    /// (partial frame kept) and `ConnectionClosed` at EOF.
    pub fn poll_once(&mut self) -> Result<ReceiveEvent, ReceiveError> {
        let frame = self.reader.read_frame()?;
        self.stats.frames += 1;

        if let Err(err) = frame.check_overflow() {
            self.stats.overflowed += 1;
            warn!(error = %err, "truncated frame");
            if self.reject_overflow {
                return Ok(self.rejected(RejectReason::Overflow {
                    dropped: frame.overflow(),
                }));
            }
        }

        let command = match self.tokenizer.tokenize(&frame) {
            Ok(command) => command,
            Err(err) => return Ok(self.rejected(RejectReason::Tokenize(err))),
        };

        match self.dispatcher.dispatch(&command) {
            Ok(()) => {
                self.stats.dispatched += 1;
                Ok(ReceiveEvent::Dispatched {
                    command,
                    overflow: frame.overflow(),
                })
            }
            Err(error) => {
                self.stats.dispatch_failures += 1;
                warn!(name = %command.name, error = %error, "dispatch failed");
                Ok(ReceiveEvent::DispatchFailed { command, error })
            }
        }
    }

    /// Loop until EOF, `stop` is set, or `limit` commands were dispatched.
    ///
    /// Read timeouts are treated as idle time so `stop` is checked
    /// regularly. EOF ends the loop normally.
    pub fn run(
        &mut self,
        stop: &AtomicBool,
        limit: Option<u64>,
    ) -> Result<ReceiverStats, ReceiveError> {
        self.run_with(stop, limit, |_| {})
    }

    /// Like [`Receiver::run`], calling `on_event` for every completed frame.
    pub fn run_with(
        &mut self,
        stop: &AtomicBool,
        limit: Option<u64>,
        mut on_event: impl FnMut(&ReceiveEvent),
    ) -> Result<ReceiverStats, ReceiveError> {
        if let Some(banner) = self.banner.take() {
            if let Err(err) = self.dispatcher.announce(&banner) {
                warn!(error = %err, "failed writing banner");
            }
        }

        while !stop.load(Ordering::SeqCst) {
            match self.poll_once() {
                Ok(event) => on_event(&event),
                Err(ReceiveError::Frame(err)) if err.is_timeout() => continue,
                Err(ReceiveError::Frame(FrameError::ConnectionClosed { partial })) => {
                    if partial {
                        warn!("link closed with an unterminated frame");
                    }
                    info!("link closed");
                    break;
                }
                Err(err) => return Err(err),
            }

            if let Some(limit) = limit {
                if self.stats.dispatched >= limit {
                    break;
                }
            }
        }

        Ok(self.stats)
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    pub fn dispatcher(&self) -> &Dispatcher<A, R> {
        &self.dispatcher
    }

    pub fn reader(&self) -> &FrameReader<S> {
        &self.reader
    }

    pub fn into_parts(self) -> (S, A, R) {
        let (actuator, reporter) = self.dispatcher.into_parts();
        (self.reader.into_inner(), actuator, reporter)
    }

    fn rejected(&mut self, reason: RejectReason) -> ReceiveEvent {
        self.stats.rejected += 1;
        warn!(%reason, "frame rejected");
        if let Err(err) = self.dispatcher.reject(&reason.to_string()) {
            debug!(error = %err, "failed reporting rejection");
        }
        ReceiveEvent::Rejected { reason }
    }
}

/// Open a serial port and build a receiver that echoes back over the same link.
pub fn open_serial<A: Actuator>(
    path: impl AsRef<Path>,
    serial: &SerialConfig,
    actuator: A,
    config: ReceiverConfig,
) -> Result<Receiver<LinkStream, A, EchoReporter<LinkStream>>, ReceiveError> {
    config
        .frame
        .validate()
        .map_err(|err| ReceiveError::Config(err.to_string()))?;

    let link = SerialLink::open_with_config(path, serial)?;
    let echo = link.try_clone()?;
    Ok(Receiver::with_config(
        link,
        actuator,
        EchoReporter::new(echo),
        config,
    ))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};

    use servolink_frame::{AccumulatorState, ParseMode, FIELD_COUNT};

    use super::*;
    use crate::actuator::{Move, RecordingActuator};
    use crate::reporter::NullReporter;

    fn receiver(input: &[u8]) -> Receiver<Cursor<Vec<u8>>, RecordingActuator, EchoReporter<Vec<u8>>> {
        Receiver::new(
            Cursor::new(input.to_vec()),
            RecordingActuator::new(),
            EchoReporter::new(Vec::new()),
        )
    }

    #[test]
    fn garbage_around_frame_dispatches_once() {
        let mut rx = receiver(b"garbage<Servo,10,20,30,40,50,60>next");
        let stats = rx.run(&AtomicBool::new(false), None).unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(stats.dispatched, 1);
        let (_, actuator, reporter) = rx.into_parts();
        assert_eq!(
            actuator.moves,
            vec![Move {
                positions: [10, 20, 30, 40, 50, 60],
                duration_ms: 20
            }]
        );
        assert_eq!(
            reporter.into_inner(),
            b"Command Servo\r\nDirection: 10 20 30 40 50 60\r\n"
        );
    }

    #[test]
    fn missing_field_is_rejected_without_motion() {
        let mut rx = receiver(b"<Servo,1,2,3>");
        let event = rx.poll_once().unwrap();

        assert!(matches!(
            event,
            ReceiveEvent::Rejected {
                reason: RejectReason::Tokenize(TokenizeError::MissingField { index: 3, .. })
            }
        ));
        assert_eq!(rx.reader().state(), AccumulatorState::IDLE);
        assert_eq!(rx.stats().rejected, 1);
        assert!(rx.dispatcher().actuator().moves.is_empty());
        let echoed = String::from_utf8(rx.dispatcher().reporter().get_ref().clone()).unwrap();
        assert!(echoed.starts_with("Rejected: missing field 3"));
    }

    #[test]
    fn loop_survives_bad_frames() {
        let mut rx = receiver(b"<Servo,1><><Servo,1,2,3,4,5,6>");
        let stats = rx.run(&AtomicBool::new(false), None).unwrap();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.dispatched, 1);
    }

    #[test]
    fn truncated_frame_dispatches_by_default() {
        let mut input = b"<Servo,1,2,3,4,5,6".to_vec();
        input.extend_from_slice(&[b'7'; 20]);
        input.push(b'>');
        let mut rx = receiver(&input);

        match rx.poll_once().unwrap() {
            ReceiveEvent::Dispatched { command, overflow } => {
                assert!(overflow > 0);
                assert_eq!(command.fields[..5], [1, 2, 3, 4, 5]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(rx.stats().overflowed, 1);
    }

    #[test]
    fn truncated_frame_can_be_rejected() {
        let config = ReceiverConfig {
            reject_overflow: true,
            ..ReceiverConfig::default()
        };
        let mut rx = Receiver::with_config(
            Cursor::new(b"<Servo,111,222,333,444,555,666,777>".to_vec()),
            RecordingActuator::new(),
            NullReporter,
            config,
        );

        let event = rx.poll_once().unwrap();
        assert!(matches!(
            event,
            ReceiveEvent::Rejected {
                reason: RejectReason::Overflow { dropped: 2 }
            }
        ));
        assert!(rx.dispatcher().actuator().moves.is_empty());
    }

    #[test]
    fn strict_mode_flows_through_config() {
        let config = ReceiverConfig {
            frame: FrameConfig {
                parse_mode: ParseMode::Strict,
                ..FrameConfig::default()
            },
            ..ReceiverConfig::default()
        };
        let mut rx = Receiver::with_config(
            Cursor::new(b"<Servo,1,2,x,4,5,6>".to_vec()),
            RecordingActuator::new(),
            NullReporter,
            config,
        );
        assert!(matches!(
            rx.poll_once().unwrap(),
            ReceiveEvent::Rejected {
                reason: RejectReason::Tokenize(TokenizeError::InvalidField { index: 2, .. })
            }
        ));
    }

    #[test]
    fn dispatch_failure_does_not_touch_framing() {
        struct Broken;
        impl Actuator for Broken {
            fn move_to(
                &mut self,
                _positions: [i32; FIELD_COUNT],
                _duration_ms: u32,
            ) -> crate::error::Result<()> {
                Err(DispatchError::Actuator("no power".to_string()))
            }
        }

        let mut rx = Receiver::new(
            Cursor::new(b"<a,1,2,3,4,5,6><b,1,2,3,4,5,6>".to_vec()),
            Broken,
            NullReporter,
        );
        assert!(matches!(
            rx.poll_once().unwrap(),
            ReceiveEvent::DispatchFailed { .. }
        ));
        assert_eq!(rx.reader().state(), AccumulatorState::IDLE);
        assert!(matches!(
            rx.poll_once().unwrap(),
            ReceiveEvent::DispatchFailed { command, .. } if command.name == "b"
        ));
        assert_eq!(rx.stats().dispatch_failures, 2);
    }

    #[test]
    fn limit_stops_after_n_dispatches() {
        let mut rx = receiver(b"<a,1,1,1,1,1,1><b,2,2,2,2,2,2><c,3,3,3,3,3,3>");
        let stats = rx.run(&AtomicBool::new(false), Some(2)).unwrap();
        assert_eq!(stats.dispatched, 2);
        assert_eq!(rx.dispatcher().actuator().moves.len(), 2);
    }

    #[test]
    fn run_with_sees_every_event() {
        let mut rx = receiver(b"<a,1,1,1,1,1,1><bad><c,3,3,3,3,3,3>");
        let mut seen = Vec::new();
        rx.run_with(&AtomicBool::new(false), None, |event| {
            seen.push(matches!(event, ReceiveEvent::Dispatched { .. }));
        })
        .unwrap();
        assert_eq!(seen, [true, false, true]);
    }

    #[test]
    fn stop_flag_prevents_reading() {
        let mut rx = receiver(b"<a,1,1,1,1,1,1>");
        let stats = rx.run(&AtomicBool::new(true), None).unwrap();
        assert_eq!(stats.frames, 0);
    }

    #[test]
    fn banner_is_announced_once() {
        let config = ReceiverConfig {
            banner: Some(DEFAULT_BANNER.to_string()),
            ..ReceiverConfig::default()
        };
        let mut rx = Receiver::with_config(
            Cursor::new(Vec::new()),
            RecordingActuator::new(),
            EchoReporter::new(Vec::new()),
            config,
        );
        rx.run(&AtomicBool::new(false), None).unwrap();
        rx.run(&AtomicBool::new(false), None).unwrap();

        let out = String::from_utf8(rx.dispatcher().reporter().get_ref().clone()).unwrap();
        assert_eq!(out.matches("Enter data").count(), 1);
    }

    #[test]
    fn timeouts_are_idle_time() {
        let source = TimeoutsThenFrame { step: 0 };
        let mut rx = Receiver::new(source, RecordingActuator::new(), NullReporter);
        let stats = rx.run(&AtomicBool::new(false), None).unwrap();
        assert_eq!(stats.dispatched, 1);
    }

    #[test]
    fn hard_io_error_ends_loop() {
        let mut rx = Receiver::new(BrokenPipe, RecordingActuator::new(), NullReporter);
        let err = rx.run(&AtomicBool::new(false), None).unwrap_err();
        assert!(matches!(err, ReceiveError::Frame(FrameError::Io(_))));
    }

    struct TimeoutsThenFrame {
        step: u8,
    }

    impl Read for TimeoutsThenFrame {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.step += 1;
            match self.step {
                1 => {
                    buf[..4].copy_from_slice(b"<a,1");
                    Ok(4)
                }
                2 | 3 => Err(std::io::Error::from(ErrorKind::TimedOut)),
                4 => {
                    buf[..11].copy_from_slice(b",2,3,4,5,6>");
                    Ok(11)
                }
                _ => Ok(0),
            }
        }
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use servolink_dispatch::{JointLimits, LimitPolicy, DEFAULT_BANNER, DEFAULT_MOVE_DURATION_MS};
use servolink_frame::{FrameConfig, ParseMode, DEFAULT_CAPACITY};
use servolink_transport::DEFAULT_BAUD_RATE;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod parse;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive frames on a serial port, move and echo each command.
    Listen(ListenArgs),
    /// Send one command frame.
    Send(SendArgs),
    /// Run the frame parser over text without opening a port.
    Parse(ParseArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

/// Framing options shared by the commands that read frames.
#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Receive buffer size in bytes, terminator slot included.
    #[arg(long, default_value_t = DEFAULT_CAPACITY, env = "SERVOLINK_CAPACITY")]
    pub capacity: usize,
    /// Reject non-numeric fields and extra tokens.
    #[arg(long)]
    pub strict: bool,
    /// Drop frames that overflowed the buffer instead of parsing the truncated bytes.
    #[arg(long)]
    pub reject_overflow: bool,
}

impl FrameArgs {
    pub fn frame_config(&self) -> CliResult<FrameConfig> {
        let config = FrameConfig {
            parse_mode: if self.strict {
                ParseMode::Strict
            } else {
                ParseMode::Permissive
            },
            ..FrameConfig::with_capacity(self.capacity)
        };
        config
            .validate()
            .map_err(|err| CliError::new(USAGE, format!("--capacity: {err}")))?;
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LimitsArg {
    /// Six-joint hobby arm ranges.
    #[default]
    Braccio,
    /// No range checks.
    None,
}

impl LimitsArg {
    pub fn joint_limits(self) -> JointLimits {
        match self {
            LimitsArg::Braccio => JointLimits::braccio(),
            LimitsArg::None => JointLimits::unbounded(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    #[default]
    Clamp,
    Reject,
}

impl From<PolicyArg> for LimitPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Clamp => LimitPolicy::Clamp,
            PolicyArg::Reject => LimitPolicy::Reject,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device (e.g. /dev/ttyACM0, COM3).
    #[arg(env = "SERVOLINK_PORT")]
    pub port: PathBuf,
    /// Line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, env = "SERVOLINK_BAUD")]
    pub baud: u32,
    /// Exit after dispatching N commands.
    #[arg(long)]
    pub count: Option<u64>,
    #[command(flatten)]
    pub frame: FrameArgs,
    /// Step duration handed to the actuator with every move.
    #[arg(long, default_value_t = DEFAULT_MOVE_DURATION_MS)]
    pub duration: u32,
    /// Do not echo commands back over the port.
    #[arg(long)]
    pub no_echo: bool,
    /// Line written to the port on start.
    #[arg(long, default_value = DEFAULT_BANNER, conflicts_with = "no_banner")]
    pub banner: String,
    /// Do not write a banner on start.
    #[arg(long)]
    pub no_banner: bool,
    /// Joint ranges applied before each move.
    #[arg(long, value_enum, default_value_t = LimitsArg::Braccio)]
    pub limits: LimitsArg,
    /// What to do with positions outside the joint ranges.
    #[arg(long, value_enum, default_value_t = PolicyArg::Clamp)]
    pub limit_policy: PolicyArg,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial device (e.g. /dev/ttyACM0, COM3).
    #[arg(env = "SERVOLINK_PORT")]
    pub port: PathBuf,
    /// Line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, env = "SERVOLINK_BAUD")]
    pub baud: u32,
    /// Command name.
    #[arg(long, default_value = "Servo")]
    pub name: String,
    /// Six comma-separated integers.
    #[arg(
        long,
        required = true,
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub fields: Vec<i32>,
    /// Receiver buffer size the frame must fit in.
    #[arg(long, default_value_t = DEFAULT_CAPACITY, env = "SERVOLINK_CAPACITY")]
    pub capacity: usize,
    /// Pause after opening the port before sending (boards that reset on open).
    #[arg(long, value_name = "DURATION")]
    pub settle: Option<String>,
    /// Read echoed lines back until the port goes quiet.
    #[arg(long)]
    pub wait: bool,
    /// Quiet period that ends --wait (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Text to parse, or `-` to read stdin.
    pub input: String,
    #[command(flatten)]
    pub frame: FrameArgs,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

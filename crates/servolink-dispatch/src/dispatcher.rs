use servolink_frame::ParsedCommand;
use tracing::debug;

use crate::actuator::Actuator;
use crate::error::Result;
use crate::reporter::Reporter;

/// Step duration handed to the actuator with every move.
pub const DEFAULT_MOVE_DURATION_MS: u32 = 20;

/// Controls what happens to each parsed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Duration passed to `Actuator::move_to`. Default: 20.
    pub move_duration_ms: u32,
    /// Echo each dispatched command through the reporter. Default: true.
    pub echo: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            move_duration_ms: DEFAULT_MOVE_DURATION_MS,
            echo: true,
        }
    }
}

/// Forwards parsed commands to an actuator, then to a reporter.
#[derive(Debug)]
pub struct Dispatcher<A, R> {
    actuator: A,
    reporter: R,
    config: DispatchConfig,
}

impl<A: Actuator, R: Reporter> Dispatcher<A, R> {
    pub fn new(actuator: A, reporter: R) -> Self {
        Self::with_config(actuator, reporter, DispatchConfig::default())
    }

    pub fn with_config(actuator: A, reporter: R, config: DispatchConfig) -> Self {
        Self {
            actuator,
            reporter,
            config,
        }
    }

    /// Move, then echo. A failed move is not echoed.
    pub fn dispatch(&mut self, command: &ParsedCommand) -> Result<()> {
        debug!(name = %command.name, fields = ?command.fields, "dispatch");
        self.actuator
            .move_to(command.fields, self.config.move_duration_ms)?;
        if self.config.echo {
            self.reporter.report(command)?;
        }
        Ok(())
    }

    /// Tell the sender a frame was dropped.
    pub fn reject(&mut self, reason: &str) -> Result<()> {
        if self.config.echo {
            self.reporter.reject(reason)?;
        }
        Ok(())
    }

    pub fn announce(&mut self, line: &str) -> Result<()> {
        self.reporter.announce(line)
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn into_parts(self) -> (A, R) {
        (self.actuator, self.reporter)
    }
}

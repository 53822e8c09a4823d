use std::io::Write;

use servolink_frame::ParsedCommand;

use crate::error::Result;

/// Reports parsed commands (and rejections) back to whoever sent them.
pub trait Reporter {
    fn report(&mut self, command: &ParsedCommand) -> Result<()>;

    /// A frame was dropped; `reason` is human-readable.
    fn reject(&mut self, _reason: &str) -> Result<()> {
        Ok(())
    }

    /// Free-form line, e.g. a startup banner.
    fn announce(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&mut self, command: &ParsedCommand) -> Result<()> {
        (**self).report(command)
    }

    fn reject(&mut self, reason: &str) -> Result<()> {
        (**self).reject(reason)
    }

    fn announce(&mut self, line: &str) -> Result<()> {
        (**self).announce(line)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _command: &ParsedCommand) -> Result<()> {
        Ok(())
    }
}

/// Echoes commands as CRLF-terminated text lines:
///
/// ```text
/// Command Servo
/// Direction: 10 20 30 40 50 60
/// ```
#[derive(Debug)]
pub struct EchoReporter<W> {
    out: W,
}

impl<W: Write> EchoReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"\r\n")?;
        Ok(())
    }
}

impl<W: Write> Reporter for EchoReporter<W> {
    fn report(&mut self, command: &ParsedCommand) -> Result<()> {
        let direction = command
            .fields
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        self.line(&format!("Command {}", command.name))?;
        self.line(&format!("Direction: {direction}"))?;
        self.out.flush()?;
        Ok(())
    }

    fn reject(&mut self, reason: &str) -> Result<()> {
        self.line(&format!("Rejected: {reason}"))?;
        self.out.flush()?;
        Ok(())
    }

    fn announce(&mut self, line: &str) -> Result<()> {
        self.line(line)?;
        self.out.flush()?;
        Ok(())
    }
}

use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use servolink_dispatch::{ReceiveEvent, ReceiverStats};
use servolink_frame::FIELD_COUNT;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One completed frame as the CLI reports it.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EventOutput {
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<[i32; FIELD_COUNT]>,
    #[serde(skip_serializing_if = "is_zero")]
    pub overflow: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&ReceiveEvent> for EventOutput {
    fn from(event: &ReceiveEvent) -> Self {
        match event {
            ReceiveEvent::Dispatched { command, overflow } => Self {
                event: "dispatched",
                name: Some(command.name.clone()),
                fields: Some(command.fields),
                overflow: *overflow,
                reason: None,
            },
            ReceiveEvent::Rejected { reason } => Self {
                event: "rejected",
                name: None,
                fields: None,
                overflow: 0,
                reason: Some(reason.to_string()),
            },
            ReceiveEvent::DispatchFailed { command, error } => Self {
                event: "dispatch_failed",
                name: Some(command.name.clone()),
                fields: Some(command.fields),
                overflow: 0,
                reason: Some(error.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    event: &'static str,
    frames: u64,
    dispatched: u64,
    rejected: u64,
    overflowed: u64,
    dispatch_failures: u64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    unterminated: bool,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

fn fields_text(fields: Option<[i32; FIELD_COUNT]>) -> String {
    fields
        .map(|fields| {
            fields
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn event_table(events: &[EventOutput]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["EVENT", "NAME", "FIELDS", "OVERFLOW", "REASON"]);
    for out in events {
        table.add_row(vec![
            out.event.to_string(),
            out.name.clone().unwrap_or_default(),
            fields_text(out.fields),
            out.overflow.to_string(),
            out.reason.clone().unwrap_or_default(),
        ]);
    }
    table
}

fn pretty_line(out: &EventOutput) -> String {
    let mut line = out.event.to_string();
    if let Some(name) = &out.name {
        line.push_str(&format!(" name={name}"));
    }
    if out.fields.is_some() {
        line.push_str(&format!(" fields=[{}]", fields_text(out.fields)));
    }
    if out.overflow > 0 {
        line.push_str(&format!(" overflow={}", out.overflow));
    }
    if let Some(reason) = &out.reason {
        line.push_str(&format!(" reason=\"{reason}\""));
    }
    line
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Print a single event as soon as it happens (one JSON object per line).
pub fn print_event(event: &ReceiveEvent, format: OutputFormat) {
    let out = EventOutput::from(event);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => println!("{}", event_table(std::slice::from_ref(&out))),
        OutputFormat::Pretty => println!("{}", pretty_line(&out)),
    }
}

/// Print a batch of events; tables get one row per event.
pub fn print_events(events: &[EventOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => events.iter().for_each(print_json),
        OutputFormat::Table => {
            if !events.is_empty() {
                println!("{}", event_table(events));
            }
        }
        OutputFormat::Pretty => events.iter().for_each(|out| println!("{}", pretty_line(out))),
    }
}

pub fn print_stats(stats: &ReceiverStats, unterminated: bool, format: OutputFormat) {
    let out = StatsOutput {
        event: "summary",
        frames: stats.frames,
        dispatched: stats.dispatched,
        rejected: stats.rejected,
        overflowed: stats.overflowed,
        dispatch_failures: stats.dispatch_failures,
        unterminated,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "FRAMES",
                    "DISPATCHED",
                    "REJECTED",
                    "OVERFLOWED",
                    "FAILED",
                    "UNTERMINATED",
                ])
                .add_row(vec![
                    out.frames.to_string(),
                    out.dispatched.to_string(),
                    out.rejected.to_string(),
                    out.overflowed.to_string(),
                    out.dispatch_failures.to_string(),
                    out.unterminated.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "summary frames={} dispatched={} rejected={} overflowed={} failed={} unterminated={}",
            out.frames,
            out.dispatched,
            out.rejected,
            out.overflowed,
            out.dispatch_failures,
            out.unterminated
        ),
    }
}

/// Print a simple list under a single header.
pub fn print_list(header: &str, key: &str, items: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let mut value = serde_json::Map::new();
            value.insert(key.to_string(), serde_json::Value::from(items.to_vec()));
            print_json(&value);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![header]);
            for item in items {
                table.add_row(vec![item.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => items.iter().for_each(|item| println!("{item}")),
    }
}

#[cfg(test)]
mod tests {
    use servolink_dispatch::RejectReason;
    use servolink_frame::{ParsedCommand, TokenizeError};

    use super::*;

    #[test]
    fn dispatched_event_serializes_without_empty_keys() {
        let event = ReceiveEvent::Dispatched {
            command: ParsedCommand::new("Servo", [1, 2, 3, 4, 5, 6]),
            overflow: 0,
        };
        let json = serde_json::to_value(EventOutput::from(&event)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "dispatched",
                "name": "Servo",
                "fields": [1, 2, 3, 4, 5, 6]
            })
        );
    }

    #[test]
    fn rejected_event_carries_reason() {
        let event = ReceiveEvent::Rejected {
            reason: RejectReason::Tokenize(TokenizeError::EmptyFrame),
        };
        let out = EventOutput::from(&event);
        assert_eq!(out.event, "rejected");
        assert!(out.reason.is_some());
        assert_eq!(pretty_line(&out), format!("rejected reason=\"{}\"", TokenizeError::EmptyFrame));
    }

    #[test]
    fn pretty_line_lists_fields() {
        let out = EventOutput {
            event: "dispatched",
            name: Some("Servo".to_string()),
            fields: Some([10, 20, 30, 40, 50, -60]),
            overflow: 3,
            reason: None,
        };
        assert_eq!(
            pretty_line(&out),
            "dispatched name=Servo fields=[10 20 30 40 50 -60] overflow=3"
        );
    }
}

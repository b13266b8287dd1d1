use std::io::Write;

use chrono::Utc;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: i64,
    pub level: String,
    pub event: String,
    #[serde(rename = "matchId", skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

impl StructuredLogLine {
    pub fn new(level: Level, event: &str, match_id: Option<&str>, details: Value) -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            level: level.as_str().to_ascii_lowercase(),
            event: event.to_string(),
            match_id: match_id.map(|value| value.to_string()),
            tick: None,
            details,
        }
    }
}

/// `log` backend writing one JSON object per line to stderr. The record
/// target becomes the `event` field.
pub struct StructuredLogger {
    match_id: Option<String>,
    level: LevelFilter,
}

impl StructuredLogger {
    pub fn new(match_id: Option<String>, level: LevelFilter) -> Self {
        Self { match_id, level }
    }

    pub fn format(&self, record: &Record) -> StructuredLogLine {
        StructuredLogLine::new(
            record.level(),
            record.target(),
            self.match_id.as_deref(),
            serde_json::json!({ "message": record.args().to_string() }),
        )
    }
}

impl Log for StructuredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        write_line(&self.format(record));
    }

    fn flush(&self) {
        // Nowhere left to report a failed stderr flush.
        std::io::stderr().flush().ok();
    }
}

/// Installs the structured logger as the global `log` backend. Returns false
/// if a logger was already installed.
pub fn init(match_id: Option<String>, debug: bool) -> bool {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let installed = log::set_boxed_logger(Box::new(StructuredLogger::new(match_id, level))).is_ok();
    if installed {
        log::set_max_level(level);
    }
    installed
}

/// Emits an explicit lifecycle event line, bypassing level filtering.
pub fn emit_event(
    level: Level,
    event: &str,
    match_id: &str,
    tick: Option<u64>,
    details: Value,
) {
    let mut line = StructuredLogLine::new(level, event, Some(match_id), details);
    line.tick = tick;
    write_line(&line);
}

/// Write failures on stderr drop the line, same as a failed flush.
fn write_line(line: &StructuredLogLine) {
    write_line_to(&mut std::io::stderr().lock(), line).ok();
}

fn write_line_to<W: Write>(out: &mut W, line: &StructuredLogLine) -> std::io::Result<()> {
    let text = serde_json::to_string(line).map_err(std::io::Error::other)?;
    writeln!(out, "{text}")
}

//! Terminal rendering of session events.

use std::io::{self, Write};

use serde_json::json;

use crate::{
    db::InspectionRecord,
    session::{EventSink, SessionEvent},
    stats::AggregateCounters,
};

pub struct ConsoleSink {
    json: bool,
    date_format: String,
}

impl ConsoleSink {
    pub fn new(json: bool, date_format: String) -> Self {
        Self { json, date_format }
    }

    pub fn emit_notice(&self, message: &str) {
        self.emit(SessionEvent::Notice {
            message: message.to_string(),
        });
    }

    fn render(&self, event: &SessionEvent) -> Vec<String> {
        match event {
            SessionEvent::IncompleteReading => vec!["Incomplete reading.".to_string()],
            SessionEvent::Classified { outcome } => vec![format!("Result: {}", outcome.label())],
            SessionEvent::RecordAppended { record } => vec![self.format_record(record)],
            SessionEvent::CountersChanged { counters } => vec![format_counters(counters)],
            SessionEvent::RecordsRestored { records } | SessionEvent::RecordsListed { records } => {
                let mut lines: Vec<String> =
                    records.iter().map(|r| self.format_record(r)).collect();
                lines.push(format!("Records: {}", records.len()));
                lines
            }
            SessionEvent::LogCleared { removed } => vec![format!("Cleared {removed} records.")],
            SessionEvent::StoreFailure { message, degraded } => {
                let mut line = format!("Storage error: {message}");
                if *degraded {
                    line.push_str(" (running without persistence)");
                }
                vec![line]
            }
            SessionEvent::Notice { message } => vec![message.clone()],
        }
    }

    fn format_record(&self, record: &InspectionRecord) -> String {
        format!(
            "#{:<6} {}  {}  {}  {}",
            record.id,
            record
                .timestamp
                .with_timezone(&chrono::Local)
                .format(&self.date_format),
            record.code_a,
            record.code_b,
            record.outcome.label()
        )
    }
}

fn format_counters(counters: &AggregateCounters) -> String {
    format!(
        "Inspections: {}  OK: {}  NG: {}",
        counters.total_inspections, counters.total_match, counters.total_mismatch
    )
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: SessionEvent) {
        let lines = if self.json {
            vec![json_line(&event)]
        } else {
            self.render(&event)
        };

        let result = if !self.json && matches!(event, SessionEvent::StoreFailure { .. }) {
            write_lines(io::stderr().lock(), &lines)
        } else {
            write_lines(io::stdout().lock(), &lines)
        };
        if let Err(err) = result {
            log::error!("Failed to write {} to terminal: {err}", event.name());
        }
    }
}

fn json_line(event: &SessionEvent) -> String {
    json!({ "event": event.name(), "payload": event }).to_string()
}

fn write_lines<W: Write>(mut out: W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

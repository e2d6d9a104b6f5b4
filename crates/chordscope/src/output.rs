//! Rendering analysis results to stdout.

use std::io::Write;

use anyhow::{bail, Result};
use harmony::KeyDetection;
use midi_live::{Analysis, AnalysisPublisher};
use serde_json::json;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => bail!("unknown output format {:?} (expected text or json)", other),
        }
    }
}

/// Writes one line per analysis to stdout.
pub struct StdoutPublisher {
    format: Format,
}

impl StdoutPublisher {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl AnalysisPublisher for StdoutPublisher {
    fn publish(&self, analysis: &Analysis) {
        let line = match self.format {
            Format::Text => analysis.summary(),
            Format::Json => match serde_json::to_string(analysis) {
                Ok(line) => line,
                Err(e) => {
                    warn!("failed to encode analysis: {}", e);
                    return;
                }
            },
        };
        emit(&line);
    }
}

/// Print one line, ignoring a closed stdout (e.g. piped into `head`).
pub fn emit(line: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{}", line);
}

pub fn chord_line(format: Format, chord: Option<&str>) -> String {
    match format {
        Format::Text => chord.unwrap_or("no chord").to_string(),
        Format::Json => json!({ "chord": chord }).to_string(),
    }
}

pub fn key_line(format: Format, detection: &KeyDetection) -> String {
    match format {
        Format::Text if detection.is_reliable() => {
            format!("{} (confidence {:.4})", detection.key, detection.confidence)
        }
        Format::Text => "no key (flat histogram)".to_string(),
        // serde_json writes NaN confidence as null
        Format::Json => json!(detection).to_string(),
    }
}

pub fn name_line(format: Format, note: i32, name: &str) -> String {
    match format {
        Format::Text => name.to_string(),
        Format::Json => json!({ "note": note, "name": name }).to_string(),
    }
}

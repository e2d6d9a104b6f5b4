//! Configuration sections.

use serde::{Deserialize, Serialize};

/// Where live MIDI comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Substring of the input port name to connect to.
    /// Default: "" (first available port)
    #[serde(default)]
    pub port: String,
}

/// How the detectors are fed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Histogram weighting: count, velocity or duration.
    /// Default: count
    #[serde(default = "AnalysisConfig::default_weighting")]
    pub weighting: String,

    /// Key whose scale notes are latched when played, e.g. "D Minor".
    /// Default: none
    #[serde(default)]
    pub highlight_key: Option<String>,
}

impl AnalysisConfig {
    fn default_weighting() -> String {
        "count".to_string()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weighting: Self::default_weighting(),
            highlight_key: None,
        }
    }
}

/// How results are written to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// text or json (one object per line).
    /// Default: text
    #[serde(default = "OutputConfig::default_format")]
    pub format: String,
}

impl OutputConfig {
    fn default_format() -> String {
        "text".to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: Self::default_format(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

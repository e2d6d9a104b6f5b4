//! Configuration loading for chordscope.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/chordscope/config.toml` (system)
//! 2. `~/.config/chordscope/config.toml` (user)
//! 3. `./chordscope.toml` (local override, or the `--config` path)
//! 4. Environment variables (`CHORDSCOPE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [input]
//! port = "Keystation"
//!
//! [analysis]
//! weighting = "duration"
//! highlight_key = "D Minor"
//!
//! [output]
//! format = "json"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{ConfigSources, discover_config_files_with_override};
pub use sections::{AnalysisConfig, InputConfig, OutputConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete chordscope configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ScopeConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./chordscope.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ScopeConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_into(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# chordscope configuration\n\n");

        output.push_str("[input]\n");
        output.push_str(&format!("port = {:?}\n", self.input.port));

        output.push_str("\n[analysis]\n");
        output.push_str(&format!("weighting = {:?}\n", self.analysis.weighting));
        match &self.analysis.highlight_key {
            Some(key) => output.push_str(&format!("highlight_key = {:?}\n", key)),
            None => output.push_str("# highlight_key = \"C Major\"\n"),
        }

        output.push_str("\n[output]\n");
        output.push_str(&format!("format = {:?}\n", self.output.format));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {:?}\n", self.telemetry.log_level));

        output
    }
}

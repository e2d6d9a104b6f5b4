//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ScopeConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/chordscope/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("chordscope/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("chordscope.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay the values set in a TOML file onto `config`.
pub fn load_into(config: &mut ScopeConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Overlay values from a TOML string. Keys absent from the file keep their
/// current value; unknown keys are ignored.
pub(crate) fn apply_toml(
    config: &mut ScopeConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let section = |name: &str| table.get(name).and_then(|v| v.as_table());
    let type_error = |key: &str, expected: &str| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("{} must be {}", key, expected),
    };

    if let Some(input) = section("input") {
        if let Some(v) = input.get("port") {
            config.input.port = v
                .as_str()
                .ok_or_else(|| type_error("input.port", "a string"))?
                .to_string();
        }
    }

    if let Some(analysis) = section("analysis") {
        if let Some(v) = analysis.get("weighting") {
            config.analysis.weighting = v
                .as_str()
                .ok_or_else(|| type_error("analysis.weighting", "a string"))?
                .to_string();
        }
        if let Some(v) = analysis.get("highlight_key") {
            let key = v
                .as_str()
                .ok_or_else(|| type_error("analysis.highlight_key", "a string"))?;
            config.analysis.highlight_key = (!key.is_empty()).then(|| key.to_string());
        }
    }

    if let Some(output) = section("output") {
        if let Some(v) = output.get("format") {
            config.output.format = v
                .as_str()
                .ok_or_else(|| type_error("output.format", "a string"))?
                .to_string();
        }
    }

    if let Some(telemetry) = section("telemetry") {
        if let Some(v) = telemetry.get("log_level") {
            config.telemetry.log_level = v
                .as_str()
                .ok_or_else(|| type_error("telemetry.log_level", "a string"))?
                .to_string();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ScopeConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

/// Apply overrides from any name → value lookup (the process environment in
/// production, a map in tests).
pub fn apply_overrides_from<F>(config: &mut ScopeConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("CHORDSCOPE_PORT") {
        config.input.port = v;
        sources.env_overrides.push("CHORDSCOPE_PORT".to_string());
    }
    if let Some(v) = lookup("CHORDSCOPE_WEIGHTING") {
        config.analysis.weighting = v;
        sources.env_overrides.push("CHORDSCOPE_WEIGHTING".to_string());
    }
    if let Some(v) = lookup("CHORDSCOPE_HIGHLIGHT_KEY") {
        config.analysis.highlight_key = (!v.is_empty()).then_some(v);
        sources.env_overrides.push("CHORDSCOPE_HIGHLIGHT_KEY".to_string());
    }
    if let Some(v) = lookup("CHORDSCOPE_OUTPUT") {
        config.output.format = v;
        sources.env_overrides.push("CHORDSCOPE_OUTPUT".to_string());
    }
    if let Some(v) = lookup("CHORDSCOPE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("CHORDSCOPE_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

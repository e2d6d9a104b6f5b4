mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harmony::Key;
use midi_live::{Session, Weighting};
use scopeconf::ScopeConfig;
use tracing_subscriber::EnvFilter;

use output::{Format, StdoutPublisher};

/// chordscope - chord and key readout for MIDI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (replaces ./chordscope.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit one JSON object per line instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Histogram weighting: count, velocity or duration
    #[arg(long, global = true)]
    weighting: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Name the chord formed by MIDI note numbers
    Chord {
        #[arg(required = true, allow_negative_numbers = true)]
        notes: Vec<i32>,
    },

    /// Detect the key of a 12-bin pitch-class histogram (C first)
    Key {
        #[arg(required = true, allow_negative_numbers = true)]
        weights: Vec<f64>,
    },

    /// Print note names for MIDI note numbers
    Name {
        #[arg(required = true, allow_negative_numbers = true)]
        notes: Vec<i32>,
    },

    /// Replay a Standard MIDI File through the analyzer
    Replay { file: PathBuf },

    /// Analyze hex MIDI messages read from stdin, one per line (e.g. "90 3C 64")
    Stdin,

    /// Analyze a live MIDI input port
    #[cfg(feature = "device")]
    Listen {
        /// Substring of the port name (overrides input.port)
        #[arg(short, long)]
        port: Option<String>,
    },

    /// List MIDI input ports
    #[cfg(feature = "device")]
    Ports,

    /// Print the effective configuration
    Config,
}

fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_session(config: &ScopeConfig, weighting: Option<&str>) -> Result<Session> {
    let weighting: Weighting = weighting
        .unwrap_or(&config.analysis.weighting)
        .parse()
        .context("invalid weighting")?;

    let highlight_key = config
        .analysis
        .highlight_key
        .as_deref()
        .map(str::parse::<Key>)
        .transpose()
        .context("invalid analysis.highlight_key")?;

    Ok(Session::new(weighting).with_highlight_key(highlight_key))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ScopeConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&config.telemetry.log_level);
    for file in &sources.files {
        tracing::debug!("Loaded config from {}", file.display());
    }
    if !sources.env_overrides.is_empty() {
        tracing::debug!("Environment overrides: {}", sources.env_overrides.join(", "));
    }

    let format = if cli.json {
        Format::Json
    } else {
        Format::parse(&config.output.format).context("invalid output.format")?
    };
    let publisher = Arc::new(StdoutPublisher::new(format));

    match cli.command {
        Commands::Chord { notes } => commands::chord(&notes, format),
        Commands::Key { weights } => commands::key(&weights, format)?,
        Commands::Name { notes } => commands::name(&notes, format),
        Commands::Replay { file } => {
            let session = build_session(&config, cli.weighting.as_deref())?;
            commands::replay(&file, session, publisher).await?;
        }
        Commands::Stdin => {
            let session = build_session(&config, cli.weighting.as_deref())?;
            commands::stdin(session, publisher).await?;
        }
        #[cfg(feature = "device")]
        Commands::Listen { port } => {
            let session = build_session(&config, cli.weighting.as_deref())?;
            let port = port.unwrap_or_else(|| config.input.port.clone());
            commands::listen(&port, session, publisher).await?;
        }
        #[cfg(feature = "device")]
        Commands::Ports => commands::ports()?,
        Commands::Config => output::emit(config.to_toml().trim_end()),
    }

    Ok(())
}

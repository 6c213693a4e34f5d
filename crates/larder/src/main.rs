//! Larder - in-process TTL cache and session store
//!
//! Operator CLI: inspects configuration and soak-tests the stores.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use larder_config::{ConfigSource, LoadedConfig, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{config, soak};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Larder - in-process TTL cache and session store
#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Load this config file instead of discovering config layers
    #[arg(long, global = true, env = "LARDER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration management
    Config(config::ConfigArgs),

    /// Drive both stores from many threads and report statistics
    Soak(soak::SoakArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load(cli.config.as_deref())?;
    let _guard = init_tracing(cli.verbose, &loaded.config.logging())?;

    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }
    for path in loaded.loaded_from() {
        tracing::debug!(path = %path.display(), "Loaded config layer");
    }

    let ctx = commands::Context {
        config: loaded.config,
        sources: loaded.sources,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Config(args) => config::run(args, &ctx).await,
        Commands::Soak(args) => soak::run(args, &ctx).await,
    }
}

/// Load an explicit config file, or discover and merge the usual layers.
fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = explicit else {
        return larder_config::load_config(None).context("failed to load configuration");
    };

    let config = larder_config::load_config_file(path)?;
    config.validate()?;

    Ok(LoadedConfig {
        config,
        sources: vec![ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        }],
        warnings: Vec::new(),
    })
}

/// Console logging on stderr plus an optional JSON log file.
///
/// `RUST_LOG` overrides the configured level. The returned guard must live
/// until exit so buffered file output is flushed.
fn init_tracing(verbose: bool, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let level = if verbose { "debug" } else { logging.level.as_str() };
    let directive = format!(
        "larder={level},larder_cache={level},larder_session={level},larder_config={level},warn"
    );
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let (file_layer, guard) = match &logging.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log file has no file name: {}", path.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(
                    "larder=trace,larder_cache=trace,larder_session=trace,larder_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

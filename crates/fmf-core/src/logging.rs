//! Logging setup, powered by tracing-subscriber.
//!
//! Console output always goes to stderr so command output on stdout stays
//! machine-readable. An optional file layer writes compact text or JSON lines
//! through a non-blocking `tracing-appender` writer.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Log file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact text: timestamp LEVEL target - message
    #[default]
    Compact,
    /// JSON Lines for structured logging
    Json,
}

/// Third-party targets that are too chatty at debug level.
const NOISY_TARGETS: &[(&str, &str)] = &[
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("reqwest", "warn"),
    ("h2", "warn"),
    ("rustls", "warn"),
];

/// Builds the filter: `RUST_LOG` wins, otherwise the configured level plus
/// overrides for noisy crates.
fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }

    let mut directives = vec![level.to_string()];
    for (target, lvl) in NOISY_TARGETS {
        directives.push(format!("{target}={lvl}"));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .with_context(|| format!("Invalid tracing filter '{filter_str}'"))
}

/// Installs the global subscriber.
///
/// Returns the file writer guard when a log file is configured; keep it alive
/// for the lifetime of the process or buffered lines are lost.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = vec![
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .with_filter(build_env_filter(&config.level)?)
            .boxed(),
    ];

    let guard = match config.file.as_deref() {
        Some(file) => {
            let (layer, guard) = file_layer(Path::new(file), config)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::trace!(level = %config.level, file = ?config.file, "logging initialized");

    Ok(guard)
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn file_layer(path: &Path, config: &LoggingConfig) -> Result<(BoxedLayer, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_filter(build_env_filter(&config.level)?)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_target(true)
            .with_filter(build_env_filter(&config.level)?)
            .boxed(),
    };

    Ok((layer, guard))
}

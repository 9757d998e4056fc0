//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events. Applications that want them
//! rendered can call [`init_tracing`] once at startup.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use crate::error::LlmError;

const DEFAULT_LOG_FILE: &str = "vertex-cache-chat.log";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or `vertex_cache_chat=debug`
    pub level: String,
    pub format: OutputFormat,
    /// Daily-rolling log file; stderr when `None`
    pub log_file: Option<PathBuf>,
    pub with_ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: OutputFormat::default(),
            log_file: None,
            with_ansi: true,
        }
    }
}

impl TracingConfig {
    pub fn builder() -> TracingConfigBuilder {
        TracingConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TracingConfigBuilder {
    config: TracingConfig,
}

impl TracingConfigBuilder {
    pub fn level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.level = level.into();
        self
    }

    pub const fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    pub const fn with_ansi(mut self, enabled: bool) -> Self {
        self.config.with_ansi = enabled;
        self
    }

    pub fn build(self) -> TracingConfig {
        self.config
    }
}

fn make_writer(config: &TracingConfig) -> (BoxMakeWriter, Option<WorkerGuard>) {
    match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let prefix = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(DEFAULT_LOG_FILE);
            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    }
}

/// Install a global subscriber.
///
/// Returns the file writer's guard when logging to a file; keep it alive for
/// the lifetime of the program or buffered lines are lost.
pub fn init_tracing(config: &TracingConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let (writer, guard) = make_writer(config);
    let ansi = config.with_ansi && config.log_file.is_none();

    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);
    let layer: Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync> = match config.format {
        OutputFormat::Pretty => base.pretty().boxed(),
        OutputFormat::Compact => base.compact().boxed(),
        OutputFormat::Json => base.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| LlmError::ConfigurationError(format!("Failed to initialize tracing: {e}")))?;

    tracing::debug!(level = %config.level, format = ?config.format, "Tracing initialized");
    Ok(guard)
}

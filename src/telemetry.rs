//! Tracing subscriber setup
//!
//! ```rust,no_run
//! use audify::telemetry::{OutputFormat, SubscriberConfig, init_subscriber};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! # Ok::<(), audify::error::AudifyError>(())
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::{AudifyError, Result};

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// One JSON object per event, with span context
    Json,
    /// JSON with event fields flattened and no span context
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = AudifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(AudifyError::ConfigurationError(format!(
                "Invalid log format: {s}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stdout when no log file is set
    pub enable_console: bool,
    /// Write to this file through a non-blocking appender instead of stdout
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::WARN,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a name such as `"info"`.
    pub fn log_level_str(mut self, level: &str) -> Result<Self> {
        self.log_level = Some(parse_level(level)?);
        Ok(self)
    }

    /// Set the log level from a 0-5 verbosity number.
    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.log_level = Some(level_from_verbosity(verbosity));
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> SubscriberConfig {
        let defaults = SubscriberConfig::default();
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(defaults.log_level),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(defaults.enable_console),
            log_file: self.log_file,
        }
    }
}

/// Map a 0-5 verbosity to a level.
///
/// 0 (panic), 1 (fatal) and 2 (error) all log errors only; 3 is warn,
/// 4 info and anything above debug.
pub fn level_from_verbosity(verbosity: u8) -> tracing::Level {
    match verbosity {
        0..=2 => tracing::Level::ERROR,
        3 => tracing::Level::WARN,
        4 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

fn parse_level(level: &str) -> Result<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(AudifyError::ConfigurationError(format!(
            "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
        ))),
    }
}

fn file_writer(path: &Path) -> Result<(BoxMakeWriter, WorkerGuard)> {
    let file_name = path.file_name().ok_or_else(|| {
        AudifyError::ConfigurationError(format!("log file {} has no file name", path.display()))
    })?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| AudifyError::IoError(format!("cannot open log file {}: {e}", path.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(writer), guard))
}

/// Install the global subscriber.
///
/// Returns the appender guard when logging to a file; keep it alive for
/// the life of the process or buffered lines are lost. Calling this when a
/// subscriber is already installed is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>> {
    let filter = format!("audify={}", config.log_level.as_str().to_lowercase());

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard))
        }
        None if config.enable_console => (BoxMakeWriter::new(std::io::stdout), None),
        None => (BoxMakeWriter::new(std::io::sink), None),
    };

    let init_result = match config.output_format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("already been set") => Ok(None),
        Err(e) => Err(AudifyError::ConfigurationError(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}

/// Build a [`SubscriberConfig`] from a variable lookup.
///
/// - `AUDIFY_LOG_LEVEL`: trace, debug, info, warn or error
/// - `AUDIFY_VERBOSITY`: 0-5, used when no level name is given
/// - `AUDIFY_LOG_FORMAT`: text, json or json-compact
/// - `AUDIFY_LOG_FILE`: path of a log file
pub fn config_from_lookup<F>(lookup: F) -> Result<SubscriberConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = SubscriberConfig::builder();

    if let Some(level) = lookup("AUDIFY_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    } else if let Some(verbosity) = lookup("AUDIFY_VERBOSITY") {
        let verbosity = verbosity.trim().parse::<u8>().map_err(|e| {
            AudifyError::ConfigurationError(format!("Invalid AUDIFY_VERBOSITY {verbosity:?}: {e}"))
        })?;
        builder = builder.verbosity(verbosity);
    }

    if let Some(format) = lookup("AUDIFY_LOG_FORMAT") {
        builder = builder.output_format(format.parse()?);
    }

    if let Some(path) = lookup("AUDIFY_LOG_FILE") {
        builder = builder.log_file(path);
    }

    Ok(builder.build())
}

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::errors::ClientError;

const DEFAULT_FILTER: &str = "info";

static INSTALLED: OnceCell<LogTarget> = OnceCell::new();

/// Where log records end up.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LogTarget {
    Disabled,
    /// Compact lines on stderr; stdout is left to rendered output.
    Console,
    /// One JSON object per line, appended to the file.
    JsonFile(PathBuf),
}

/// Logging options, usually filled from command-line flags.
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub enabled: bool,
    /// Filter directive such as `info` or `review_client=debug`.
    /// Falls back to `RUST_LOG`, then `info`.
    pub filter: Option<String>,
    pub json_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: None,
            json_path: None,
        }
    }
}

impl LogConfig {
    pub fn target(&self) -> LogTarget {
        match (self.enabled, &self.json_path) {
            (false, _) => LogTarget::Disabled,
            (true, Some(path)) => LogTarget::JsonFile(path.clone()),
            (true, None) => LogTarget::Console,
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, ClientError> {
        match self.filter.as_deref().map(str::trim) {
            Some(directive) if !directive.is_empty() => EnvFilter::try_new(directive)
                .map_err(|e| ClientError::Config(format!("invalid log filter {directive:?}: {e}"))),
            _ => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
        }
    }
}

fn json_writer(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender, ClientError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ClientError::Config(format!("log path {} has no file name", path.display())))?;
    tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| ClientError::Config(format!("cannot open log file {}: {e}", path.display())))
}

fn install(config: &LogConfig) -> Result<LogTarget, ClientError> {
    let target = config.target();
    match &target {
        LogTarget::Disabled => {}
        LogTarget::Console => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(config.env_filter()?)
                .with(layer)
                .try_init();
        }
        LogTarget::JsonFile(path) => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(false)
                .with_writer(json_writer(path)?);
            let _ = tracing_subscriber::registry()
                .with(config.env_filter()?)
                .with(layer)
                .try_init();
        }
    }
    Ok(target)
}

/// Installs the process-wide subscriber described by `config`.
///
/// Only the first successful call installs anything; later calls return the
/// target chosen then.
pub fn init_observability(config: &LogConfig) -> Result<LogTarget, ClientError> {
    INSTALLED.get_or_try_init(|| install(config)).cloned()
}

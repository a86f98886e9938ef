//! Logging setup using tracing.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a log level, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Print logs to stderr.
    pub print: bool,
    pub level: LogLevel,
    /// Include file/line info in log lines.
    pub include_location: bool,
    /// Append logs to this file when not printing.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            print: false,
            level: LogLevel::Info,
            include_location: false,
            file: None,
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// `RUST_LOG` takes precedence over `config.level`. Stderr output wins over the
/// log file when both are configured; with neither the registry only filters.
pub fn init(config: LogConfig) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let subscriber = tracing_subscriber::registry().with(filter);

    if config.print {
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location);
        subscriber.with(layer).init();
    } else if let Some(path) = config.file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location);
        subscriber.with(layer).init();
    } else {
        subscriber.init();
    }
    Ok(())
}

/// Default log file location.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("threadline").join("logs").join("threadline.log"))
}

//! Logging initialization.
//!
//! Verbose runs log to stderr; otherwise logs go to the platform log file.

use threadline_util::log::{self, default_log_path, LogConfig, LogLevel};

pub fn init_logging(verbose: bool, level: Option<&str>) {
    let level = match level {
        Some(raw) => LogLevel::parse(raw).unwrap_or_else(|| {
            eprintln!("Warning: unknown log level {raw:?}, using info");
            LogLevel::Info
        }),
        None if verbose => LogLevel::Debug,
        None => LogLevel::Info,
    };

    let config = LogConfig {
        print: verbose,
        level,
        include_location: verbose,
        file: if verbose { None } else { default_log_path() },
    };

    if let Err(e) = log::init(config) {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

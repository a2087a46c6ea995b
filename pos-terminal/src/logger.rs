//! Logging Infrastructure
//!
//! Structured `tracing` output to stdout, or to a daily rolling file when a
//! log directory exists.

use crate::TerminalConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger at `info`
pub fn init_logger() -> bool {
    init_logger_with_file(None, None)
}

/// Initialize the logger from terminal configuration
pub fn init_from_config(config: &TerminalConfig) -> bool {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref())
}

/// Initialize the logger with optional file output
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) -> bool {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "pos-terminal");
            return subscriber
                .with_ansi(false)
                .with_writer(file_appender)
                .try_init()
                .is_ok();
        }
    }

    subscriber.try_init().is_ok()
}

//! Logging Infrastructure
//!
//! `tracing-subscriber` with an `EnvFilter`, optional JSON output and an
//! optional daily rolling file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when neither LOG_LEVEL nor RUST_LOG is set
pub const DEFAULT_FILTER: &str = "guild_server=info,tower_http=info";

/// Build the filter: explicit directive, then RUST_LOG, then the default
pub fn build_filter(log_level: Option<&str>) -> EnvFilter {
    match log_level {
        Some(directive) => {
            EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Initialize the logger with optional JSON output and file output.
///
/// The returned guard must be held for the lifetime of the process when
/// logging to a file, otherwise buffered lines are lost.
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: bool,
    log_dir: Option<&str>,
) -> Option<WorkerGuard> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(log_level))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "guild-server");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let builder = builder.with_writer(writer).with_ansi(false);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
            return Some(guard);
        }
        eprintln!("LOG_DIR {dir} does not exist, logging to stdout");
    }

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_directive_wins() {
        let filter = build_filter(Some("guild_server=debug"));
        assert!(filter.to_string().contains("guild_server=debug"));
    }

    #[test]
    fn test_invalid_directive_falls_back() {
        let filter = build_filter(Some("guild_server=loud"));
        assert!(filter.to_string().contains("guild_server=info"));
    }
}

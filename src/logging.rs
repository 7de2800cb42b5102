//! Logging initialization for stepform.
//!
//! TUI mode: logs to `<state>/logs/stepform-{datetime}.log`
//! CLI and server modes: logs to stderr

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Flushes buffered log lines when dropped; keep alive until exit
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file (only set in TUI mode with file logging enabled)
    pub log_file_path: Option<PathBuf>,
}

/// Filter directive: `RUST_LOG` when set, else `--debug`, else the config level
fn filter_directive(rust_log: Option<String>, config: &Config, debug_override: bool) -> String {
    rust_log.unwrap_or_else(|| {
        if debug_override {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        }
    })
}

fn log_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("stepform-{}.log", now.format("%Y%m%dT%H%M%SZ"))
}

/// Install the global subscriber.
///
/// The terminal is owned by the wizard in TUI mode, so log lines go to a
/// file there instead of stderr.
pub fn init_logging(
    config: &Config,
    is_tui_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), config, debug_override);
    let filter = EnvFilter::new(directive);

    if is_tui_mode && config.logging.to_file {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

        let log_filename = log_file_name(chrono::Utc::now());
        let log_file_path = logs_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();

        Ok(LoggingHandle {
            _guard: Some(guard),
            log_file_path: Some(log_file_path),
        })
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();

        Ok(LoggingHandle {
            _guard: None,
            log_file_path: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_name_format() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(log_file_name(now), "stepform-20260309T140507Z.log");
    }

    #[test]
    fn test_logs_dir_under_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();

        let logs_dir = config.logs_path();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(temp_dir.path()));
    }

    #[test]
    fn test_debug_flag_overrides_configured_level() {
        let mut config = Config::default();
        config.logging.level = "warn".to_string();

        assert_eq!(filter_directive(None, &config, false), "warn");
        assert_eq!(filter_directive(None, &config, true), "debug");
    }

    #[test]
    fn test_rust_log_wins_over_debug_flag() {
        let config = Config::default();
        let rust_log = Some("stepform=trace".to_string());

        assert_eq!(filter_directive(rust_log.clone(), &config, true), "stepform=trace");
        assert_eq!(filter_directive(rust_log, &config, false), "stepform=trace");
    }
}

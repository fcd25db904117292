//! Logging initialization.
//!
//! Default: logs to stderr
//! `logging.to_file`: logs to `<state_dir>/trello-gcal-sync/logs/trello-gcal-sync-{datetime}.log`

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Guard that must be kept alive for the duration of the program.
    /// When dropped, ensures all buffered logs are flushed.
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file (only set with file logging enabled)
    pub log_file_path: Option<PathBuf>,
}

/// Resolve the filter directive: `RUST_LOG`, then `--verbose`, then config
fn filter_directive(config: &Config, verbose: bool, rust_log: Option<String>) -> String {
    rust_log.filter(|v| !v.is_empty()).unwrap_or_else(|| {
        if verbose {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        }
    })
}

fn log_file_name(now: DateTime<Utc>) -> String {
    format!("trello-gcal-sync-{}.log", now.format("%Y%m%dT%H%M%SZ"))
}

/// Initialize logging from configuration.
///
/// # Arguments
/// * `config` - Application configuration
/// * `verbose` - If true, log at "debug" unless `RUST_LOG` says otherwise
///
/// # Returns
/// A `LoggingHandle` that must be kept alive for the duration of the program.
pub fn init_logging(config: &Config, verbose: bool) -> Result<LoggingHandle> {
    let directive = filter_directive(config, verbose, std::env::var("RUST_LOG").ok());
    let filter = tracing_subscriber::EnvFilter::new(directive);

    if config.logging.to_file {
        let logs_dir = Config::logs_path();
        std::fs::create_dir_all(&logs_dir)?;

        let log_filename = log_file_name(Utc::now());
        let log_file_path = logs_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false) // No ANSI codes in log files
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

    #[test]
    fn test_rust_log_takes_precedence() {
        let config = Config::default();
        assert_eq!(
            filter_directive(&config, true, Some("warn".to_string())),
            "warn"
        );
    }

    #[test]
    fn test_verbose_overrides_config_level() {
        let mut config = Config::default();
        config.logging.level = "error".to_string();
        assert_eq!(filter_directive(&config, true, None), "debug");
        assert_eq!(filter_directive(&config, false, None), "error");
        assert_eq!(
            filter_directive(&config, false, Some(String::new())),
            "error"
        );
    }

    #[test]
    fn test_log_file_name_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 8, 47, 44).unwrap();
        assert_eq!(log_file_name(now), "trello-gcal-sync-20240315T084744Z.log");
    }

    #[test]
    fn test_logs_path_is_app_scoped() {
        let logs_dir = Config::logs_path();
        assert!(logs_dir.ends_with("trello-gcal-sync/logs"));
    }
}

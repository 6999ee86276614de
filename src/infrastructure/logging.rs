//! Logging system configuration and initialization
//!
//! - Console and optional file output
//! - Configuration based level control, `RUST_LOG` overrides
//! - Structured JSON file logs (optional)
//! - Moscow time (UTC+3) timestamps, matching the registry's clock
//! - Previous log file rotated by timestamp on startup

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

const MSK_OFFSET_SECONDS: i32 = 3 * 3600;

/// Targets kept quiet unless trace level is requested
const NOISY_TARGETS: [(&str, &str); 5] = [
    ("headless_chrome", "warn"),
    ("tungstenite", "warn"),
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("h2", "warn"),
];

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

fn msk_offset() -> FixedOffset {
    FixedOffset::east_opt(MSK_OFFSET_SECONDS).unwrap_or(Utc.fix())
}

fn to_msk(time: DateTime<Utc>) -> DateTime<FixedOffset> {
    time.with_timezone(&msk_offset())
}

/// Timestamp formatter for Moscow time (UTC+3)
struct MskTimeFormatter;

impl FormatTime for MskTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", to_msk(Utc::now()).format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Log directory: configured, else `logs/` next to the executable
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = &config.directory {
        return dir.clone();
    }

    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("logs")
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => configured_filter(config),
    }
}

/// Filter from the configured level; noisy targets stay quiet below trace
fn configured_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in NOISY_TARGETS {
            filter = filter.add_directive(format!("{target}={level}").parse()?);
        }
    }

    for (target, level) in &config.module_filters {
        filter = filter.add_directive(
            format!("{target}={level}")
                .parse()
                .with_context(|| format!("Invalid module filter {}={}", target, level))?,
        );
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` replaces the configured filter entirely:
/// ```bash
/// RUST_LOG="debug,headless_chrome=debug" rmsp-lookup input.xlsx
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&config)?;
    let registry = Registry::default().with(env_filter);

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(MskTimeFormatter)
            .with_target(false)
    });

    let log_dir = get_log_directory(&config);

    match (config.file_output, config.json_format) {
        (false, _) => {
            if console_layer.is_none() {
                return Err(anyhow!("No logging output configured"));
            }
            registry.with(console_layer).try_init()?;
        }
        (true, json) => {
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
            rotate_existing_log_file(&log_dir, &config.file_name)?;
            if config.auto_cleanup_logs {
                cleanup_old_logs(&log_dir, &config)?;
            }

            let file_appender = rolling::never(&log_dir, &config.file_name);
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS
                .lock()
                .map_err(|_| anyhow!("Log guard registry poisoned"))?
                .push(file_guard);

            if json {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(MskTimeFormatter)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false);
                registry.with(console_layer).with(file_layer).try_init()?;
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(MskTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                registry.with(console_layer).with(file_layer).try_init()?;
            }
        }
    }

    info!("Logging initialized (level: {})", config.level);
    if config.file_output {
        info!("Log file: {:?}", log_dir.join(&config.file_name));
    }
    Ok(())
}

/// Rename an existing log file to `<stem>.<timestamp>.log`
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<()> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(&log_file_path)
        .with_context(|| format!("Failed to get log file metadata: {:?}", log_file_path))?;
    let file_time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or_else(|_| std::time::SystemTime::now());

    let timestamped_path = log_dir.join(rotated_name(log_file_name, to_msk(file_time.into())));
    std::fs::rename(&log_file_path, &timestamped_path).with_context(|| {
        format!(
            "Failed to rotate log file {} to {}",
            log_file_path.display(),
            timestamped_path.display()
        )
    })?;

    Ok(())
}

fn rotated_name(log_file_name: &str, time: DateTime<FixedOffset>) -> String {
    let stem = log_file_name.trim_end_matches(".log");
    format!("{}.{}.log", stem, time.format("%Y%m%dT%H%M%S"))
}

/// Remove old log files beyond `max_files` (or all but the newest)
fn cleanup_old_logs(log_dir: &Path, config: &LoggingConfig) -> Result<usize> {
    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.extension().is_some_and(|ext| ext == "log");
        if !path.is_file() || !is_log {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let keep = if config.keep_only_latest {
        1
    } else {
        config.max_files as usize
    };

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn configured_directory_wins() {
        let config = LoggingConfig {
            directory: Some(PathBuf::from("/tmp/rmsp-logs")),
            ..LoggingConfig::default()
        };
        assert_eq!(get_log_directory(&config), PathBuf::from("/tmp/rmsp-logs"));
        assert!(get_log_directory(&LoggingConfig::default()).ends_with("logs"));
    }

    #[test]
    fn trace_level_lets_noisy_targets_through() {
        let trace = LoggingConfig {
            level: "trace".to_string(),
            ..LoggingConfig::default()
        };
        let directives = configured_filter(&trace).unwrap().to_string();
        assert!(!directives.contains("headless_chrome"));
        assert!(!directives.contains("hyper"));

        let info = configured_filter(&LoggingConfig::default()).unwrap().to_string();
        assert!(info.contains("headless_chrome=warn"));
    }

    #[test]
    fn explicit_module_filters_apply_at_any_level() {
        let config = LoggingConfig {
            level: "trace".to_string(),
            module_filters: [("headless_chrome".to_string(), "error".to_string())].into(),
            ..LoggingConfig::default()
        };
        let directives = configured_filter(&config).unwrap().to_string();
        assert!(directives.contains("headless_chrome=error"));
    }

    #[test]
    fn timestamps_are_moscow_time() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 21, 30, 0).unwrap();
        assert_eq!(to_msk(utc).format("%Y-%m-%d %H:%M").to_string(), "2024-03-02 00:30");
    }

    #[test]
    fn rotation_appends_timestamp() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(
            rotated_name("rmsp-lookup.log", to_msk(utc)),
            "rmsp-lookup.20240301T120000.log"
        );
    }

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.log", "b.log", "c.log", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let config = LoggingConfig {
            max_files: 2,
            ..LoggingConfig::default()
        };
        assert_eq!(cleanup_old_logs(dir.path(), &config).unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn rotation_moves_existing_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rmsp-lookup.log"), "old run").unwrap();
        rotate_existing_log_file(dir.path(), "rmsp-lookup.log").unwrap();
        assert!(!dir.path().join("rmsp-lookup.log").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

//! Structured logging: JSONL file plus human-readable stderr.
//!
//! The file layer writes through a non-blocking appender; keep the
//! returned guard alive for the process lifetime or buffered lines are
//! lost on exit.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber. Call once, early in main.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log dir: {}", e);
    }
    let log_path = log_path();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);
    let (non_blocking_file, file_guard) = match file {
        Ok(file) => tracing_appender::non_blocking(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            tracing_appender::non_blocking(std::io::sink())
        }
    };

    // Default to info, allow override via RUST_LOG
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSONL layer for file output
    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    // Pretty layer for stderr
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".copydeck").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("copydeck-logs"))
}

/// Path to the JSONL log file.
pub fn log_path() -> PathBuf {
    get_log_dir().join("copydeck.jsonl")
}

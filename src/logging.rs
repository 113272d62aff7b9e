//! Tracing setup for server diagnostics.
//!
//! Events go to stdout through a compact formatter and are mirrored to a log file through a
//! non-blocking appender. The file defaults to `logs/inventory-ingest.log` and can be moved
//! with `INVENTORY_LOG_FILE`. None of this is related to the in-memory request log served by
//! `GET /api/logs`; that one lives in [`crate::request_log`].
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_NAME: &str = "inventory-ingest.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. `RUST_LOG` controls filtering and defaults to `info`.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact());

    match file_writer(&log_file_path()) {
        Some(writer) => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .compact(),
            )
            .init(),
        None => registry.init(),
    }
}

/// Resolve the diagnostic log file from `INVENTORY_LOG_FILE` or the default location.
pub fn log_file_path() -> PathBuf {
    std::env::var("INVENTORY_LOG_FILE")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_NAME))
}

// The guard is parked in a static so buffered lines flush for the whole process lifetime.
fn file_writer(path: &Path) -> Option<NonBlocking> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if let Err(err) = std::fs::create_dir_all(directory) {
        eprintln!("Failed to create log directory {}: {err}", directory.display());
        return None;
    }
    let file_name = path.file_name()?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

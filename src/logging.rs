//! Tracing configuration and log routing.
//!
//! Ingestion runs log to stdout using a compact formatter and, in parallel, to a file. When
//! `RAGDEX_LOG_FILE` is set, logs are appended to that path; otherwise the file logger writes
//! to `logs/ragdex.log`. The file layer goes through a non‑blocking writer so slow disks do not
//! stall batch uploads.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_ENV: &str = "RAGDEX_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "ragdex.log";

/// Configure tracing subscribers for stdout and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stdout layer and, when available, a file layer.
/// - Keeps the non‑blocking writer guard alive for the process lifetime.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    if let Some(writer) = configure_file_writer() {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

/// Build a non‑blocking writer for file logging.
///
/// Returns `None` when the logs directory cannot be created or the target file cannot be opened.
fn configure_file_writer() -> Option<NonBlocking> {
    let (non_blocking, guard) = match std::env::var(LOG_FILE_ENV) {
        Ok(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .inspect_err(|err| eprintln!("Failed to open log file {path}: {err}"))
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        Err(_) => {
            std::fs::create_dir_all(DEFAULT_LOG_DIR)
                .inspect_err(|err| eprintln!("Failed to create logs directory: {err}"))
                .ok()?;
            let appender = tracing_appender::rolling::never(DEFAULT_LOG_DIR, DEFAULT_LOG_FILE);
            tracing_appender::non_blocking(appender)
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

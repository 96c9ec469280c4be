//! # Logging
//!
//! File-only tracing. Stdout and stderr carry the CLI protocol, so log lines
//! never go to the console.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::domain::config::AppConfig;

const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the file subscriber. The returned guard must live until exit so
/// buffered lines are flushed. Returns `None` when the log file cannot be
/// used; Alfred then runs without logs.
pub fn init(config: &AppConfig) -> Option<WorkerGuard> {
    let log_path = config.log_file();
    let (dir, file_name) = match (log_path.parent(), log_path.file_name()) {
        (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_os_string()),
        _ => (Path::new(".").to_path_buf(), log_path.as_os_str().to_os_string()),
    };

    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Warning: cannot create log directory {}: {e}", dir.display());
        return None;
    }

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    if tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init()
        .is_err()
    {
        return None;
    }

    tracing::info!("Alfred {} starting", env!("CARGO_PKG_VERSION"));
    Some(guard)
}

// src/logging.rs
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FILE: &str = "DIGEST_LOG_FILE";
pub const ENV_LOG_JSON: &str = "DIGEST_LOG_JSON";
pub const DEFAULT_LOG_FILE: &str = "logs/digest.log";
const DEFAULT_FILTER: &str = "feed_digest=info,warn";

pub fn log_file_path() -> PathBuf {
    std::env::var(ENV_LOG_FILE)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Stdout (compact, or JSON with `DIGEST_LOG_JSON=1`) plus an appending,
/// non-ANSI log file. `RUST_LOG` overrides the default filter. If the file
/// cannot be opened, logs go to stdout only.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1");
    let (compact_layer, json_layer) = if json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer().compact().with_target(false)), None)
    };

    let path = log_file_path();
    let file = open_log_file(&path);
    let file_layer = file
        .as_ref()
        .ok()
        .and_then(|f| f.try_clone().ok())
        .map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(compact_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();

    if let Err(e) = file {
        tracing::warn!(path = %path.display(), error = %e, "log file unavailable, stdout only");
    }
}

//! Logging setup for the bridge.
//!
//! Console output is human-readable or JSON. When `logging.file_path` is set,
//! a plain-text copy of every event is appended to that file as well, which is
//! where the record of mapping data loaded for intents ends up on unattended
//! builds.

use crate::config::LoggingSettings;
use crate::error::BridgeError;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, Subscriber};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Initializes the logging system with the specified configuration.
///
/// Respects `RUST_LOG` if set, otherwise filters by the configured level.
/// `json_format` forces JSON console output regardless of the configuration.
pub fn setup_logging(
    config: &LoggingSettings,
    json_format: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console = if json_format || config.json_format {
        fmt::layer().json().with_thread_names(true).boxed()
    } else {
        fmt::layer().with_thread_names(true).boxed()
    };

    let log_file = match config.file_path.as_deref() {
        Some(path) => Some(open_log_file(Path::new(path))?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(log_file.map(file_layer))
        .try_init()?;

    info!("🔧 Logging initialized with level: {}", config.level);
    if let Some(path) = &config.file_path {
        info!("📝 Writing a copy of the log to {}", path);
    }
    Ok(())
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File, BridgeError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| BridgeError::Config(format!("Cannot open log file {}: {e}", path.display())))
}

fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Arc::new(file))
}

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LoggingSettings, default_log_path};

/// `RUST_LOG` wins over the configured level.
fn filter_for(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("spindle=info"))
}

/// Route `tracing` output to the log file; the terminal belongs to the TUI.
pub fn init(settings: &LoggingSettings) -> Result<PathBuf, Box<dyn Error>> {
    let path = settings
        .file
        .clone()
        .or_else(default_log_path)
        .ok_or("no log file location")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter_for(settings))
        .with(fmt_layer)
        .try_init()?;

    Ok(path)
}

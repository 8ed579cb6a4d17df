//! File-backed tracing setup. The terminal UI owns stdout, so events go to
//! `kanboard.log` in the data directory instead.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{BoardError, Result};

const LOG_FILE_NAME: &str = "kanboard.log";

/// Installs the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// Calling this again is harmless: the first subscriber stays installed.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE_NAME);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| BoardError::Logging(format!("invalid log level `{}`: {}", level, e)))?,
    };

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            log_file = %path.display(),
            "logging started"
        );
    } else {
        debug!("logging already initialized");
    }
    Ok(path)
}

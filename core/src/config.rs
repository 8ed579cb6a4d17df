use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::service::board::FailurePolicy;
use crate::error::{BoardError, Result};
use crate::gesture::PointerConstraint;
use crate::reorder::WritePolicy;

const APP_DIR_NAME: &str = ".kanboard";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ReorderConfig {
    pub write_policy: WritePolicy,
    pub failure_policy: FailurePolicy,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DragConfig {
    pub activation_delay_ms: u64,
    /// Cells the pointer may travel before the delay elapses.
    pub tolerance: u16,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_delay_ms: 200,
            tolerance: 10,
        }
    }
}

impl DragConfig {
    pub fn constraint(&self) -> PointerConstraint {
        PointerConstraint {
            delay: Duration::from_millis(self.activation_delay_ms),
            tolerance: self.tolerance,
        }
    }
}

/// `~/.kanboard/config.toml`. Every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
    pub theme: Theme,
    pub reorder: ReorderConfig,
    pub drag: DragConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: "info".to_string(),
            theme: Theme::default(),
            reorder: ReorderConfig::default(),
            drag: DragConfig::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or the default location when `None`. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_data_dir()?.join(CONFIG_FILE_NAME), false),
        };

        if !path.exists() {
            if explicit {
                return Err(BoardError::Config {
                    path,
                    message: "file does not exist".to_string(),
                });
            }
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)?;
        Self::parse(&text).map_err(|message| BoardError::Config { path, message })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "could not determine home directory")
    })?;
    Ok(home_dir.join(APP_DIR_NAME))
}

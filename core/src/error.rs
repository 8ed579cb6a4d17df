use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("task {0} not found")]
    NotFound(Uuid),

    #[error("write failed: {0}")]
    TransientWrite(String),

    #[error("{0}")]
    Unknown(String),

    #[error("{0}")]
    Ambiguous(String),

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl BoardError {
    /// Errors a later snapshot can heal: the write never landed, local state is stale.
    pub fn is_transient(&self) -> bool {
        matches!(self, BoardError::TransientWrite(_) | BoardError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;

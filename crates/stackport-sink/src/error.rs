//! Sink error types

use std::path::PathBuf;
use thiserror::Error;

/// File sink errors
#[derive(Error, Debug)]
pub enum FileWriteError {
    #[error("Unsupported output file format: {} (use .json, .yaml, .yml or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to serialize outputs: {0}")]
    Serialize(String),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handler sink errors
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid handler reference '{0}': expected <module-path>.<function>")]
    InvalidReference(String),

    #[error("Cannot resolve handler '{reference}': {reason}")]
    Resolution { reference: String, reason: String },

    #[error("Handler '{reference}' failed: {message}")]
    Failed { reference: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    /// Whether the handler could not be found or loaded at all
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            HandlerError::InvalidReference(_) | HandlerError::Resolution { .. }
        )
    }
}

//! Registry client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid registry URI: {0}")]
    InvalidUri(String),

    #[error("Registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Registry returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected registry response: {0}")]
    InvalidResponse(String),

    #[error("Registry response has no ServiceID")]
    MissingServiceId,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

//! Pipeline error types

use crate::outcome::Stage;
use stackport_registry::RegistryError;
use stackport_sink::{FileWriteError, HandlerError};
use thiserror::Error;

/// Preconditions checked before any I/O
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Only supported for AWS provider (got '{0}')")]
    UnsupportedProvider(String),

    #[error("Skipping deployment with --noDeploy flag")]
    SkipRequested,

    #[error("Invalid deployment identity: {0}")]
    InvalidIdentity(String),
}

/// Stack description could not be retrieved
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to describe stack {stack}: {message}")]
    Request { stack: String, message: String },

    #[error("Invalid describe-stacks response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal error cause
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors that abort a flow before any sink runs
#[derive(Error, Debug)]
#[error("{source} (while {stage})")]
pub struct PipelineError {
    /// Stage the flow was in when it failed
    pub stage: Stage,
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    /// The skip flag was set; not a failure
    pub fn is_skip(&self) -> bool {
        matches!(
            self.source,
            StageError::Validation(ValidationError::SkipRequested)
        )
    }
}

/// Failure of a single sink; siblings are unaffected
#[derive(Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    File(#[from] FileWriteError),

    #[error("Failed to build registration payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

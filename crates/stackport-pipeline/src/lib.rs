//! stackport pipeline
//!
//! Runs the deploy and remove flows: validate the deployment, describe the
//! CloudFormation stack, normalize its outputs and fan them out to the
//! registry, handler and file sinks.
//!
//! ```ignore
//! let pipeline = Pipeline::new(identity, config.discovery(), Arc::new(fetcher))
//!     .with_options(options);
//! pipeline.after_deploy().await;
//! ```

pub mod error;
pub mod fetch;
pub mod outcome;
pub mod pipeline;

pub use error::{FetchError, PipelineError, Result, SinkError, StageError, ValidationError};
pub use fetch::{StackFetcher, StaticFetcher};
pub use outcome::{Flow, PipelineReport, SinkKind, SinkOutcome, SinkStatus, Stage};
pub use pipeline::Pipeline;

//! stackport sinks
//!
//! Consumers of the normalized stack outputs that live on the local machine:
//!
//! - **File**: writes the outputs as JSON, YAML or TOML
//! - **Handler**: passes the outputs to a registered handler or an external command
//!
//! The remote discovery registry lives in `stackport-registry`.

pub mod command;
pub mod error;
pub mod file;
pub mod handler;

pub use command::CommandHandler;
pub use error::{FileWriteError, HandlerError};
pub use file::{FileSink, OutputFormat};
pub use handler::{
    FnHandler, HandlerContext, HandlerRef, HandlerRegistry, HandlerResolver, OutputHandler,
};

//! stackport core
//!
//! Data model and pure transformations shared by every stackport crate.
//!
//! # Data flow
//!
//! ```text
//! describe-stacks ──▶ normalize() ──▶ NormalizedOutputMap ──┬──▶ file sink
//!                                                           ├──▶ handler sink
//!                          DeploymentPropertyTemplate ──▶ resolve() ──▶ registry
//! ```
//!
//! Nothing in this crate performs I/O except configuration loading.

pub mod config;
pub mod credentials;
pub mod error;
pub mod model;
pub mod normalize;
pub mod template;

// Re-exports
pub use config::{
    CONFIG_PATH_ENV, DiscoveryConfig, ProjectConfig, ProviderConfig, find_config_file,
    find_config_file_in,
};
pub use credentials::Credentials;
pub use error::{ConfigError, Result};
pub use model::{
    DeploymentIdentity, NormalizedOutputMap, SERVICE_ENDPOINT_KEY, StackDescription,
    StackDescriptionList, StackOutputPair,
};
pub use normalize::normalize;
pub use template::{
    DEPLOYMENT_PROP_MARKER, DeploymentPropertyTemplate, ResolvedProperties, TemplateValue,
    resolve,
};

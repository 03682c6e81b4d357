//! stackport registry client
//!
//! Registers deployed services with a serverless discovery service and
//! removes them again on teardown.
//!
//! # Example
//!
//! ```ignore
//! use stackport_registry::{DiscoveryClient, DiscoveryClientConfig, ServiceQuery, ServiceRegistry};
//!
//! let client = DiscoveryClient::new(DiscoveryClientConfig {
//!     uri: "https://abcdefghij.execute-api.us-east-1.amazonaws.com/dev".to_string(),
//!     credentials,
//!     region: "us-east-1".to_string(),
//! })?;
//!
//! let created = client.register(&registration).await?;
//! client.deregister(&ServiceQuery::new("orders", "dev")).await?;
//! ```

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod model;
pub mod registry;
pub mod sigv4;

pub use client::{DiscoveryClient, DiscoveryClientConfig};
pub use error::{RegistryError, Result};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemoryRegistry, RegistryCall};
pub use model::{ServiceQuery, ServiceRegistration};
pub use registry::ServiceRegistry;

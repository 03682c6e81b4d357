use async_trait::async_trait;
use stackport_core::{
    DeploymentIdentity, DiscoveryConfig, StackDescription, StackDescriptionList, StackOutputPair,
};
use stackport_pipeline::{FetchError, StackFetcher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const DISCOVERY_URI: &str = "https://abc123.execute-api.us-east-1.amazonaws.com/dev";

/// Service directory in a temp dir
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn identity(&self) -> DeploymentIdentity {
        DeploymentIdentity::new("orders", "dev", "us-east-1", "aws", self.path())
    }
}

/// Fixed stack outputs; counts how often it was asked
pub struct CountingFetcher {
    stacks: StackDescriptionList,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new(outputs: &[(&str, &str)]) -> Self {
        let pairs = outputs
            .iter()
            .map(|(k, v)| StackOutputPair::new(*k, *v))
            .collect();
        Self {
            stacks: StackDescriptionList::new(vec![StackDescription::new(pairs)]),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StackFetcher for CountingFetcher {
    async fn fetch(&self, _identity: &DeploymentIdentity) -> Result<StackDescriptionList, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stacks.clone())
    }
}

pub struct FailingFetcher;

#[async_trait]
impl StackFetcher for FailingFetcher {
    async fn fetch(&self, identity: &DeploymentIdentity) -> Result<StackDescriptionList, FetchError> {
        Err(FetchError::Request {
            stack: identity.stack_name(),
            message: "Stack with id orders-dev does not exist".to_string(),
        })
    }
}

pub fn discovery_with_uri() -> DiscoveryConfig {
    DiscoveryConfig {
        discovery_service_uri: Some(DISCOVERY_URI.to_string()),
        ..Default::default()
    }
}

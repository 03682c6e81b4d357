//! Stack description retrieval

use crate::error::FetchError;
use async_trait::async_trait;
use stackport_core::{DeploymentIdentity, StackDescriptionList};

/// Source of CloudFormation stack descriptions
#[async_trait]
pub trait StackFetcher: Send + Sync {
    /// Describe the stack named by `identity.stack_name()` in `identity.region`
    async fn fetch(&self, identity: &DeploymentIdentity) -> Result<StackDescriptionList, FetchError>;
}

/// Returns a fixed description regardless of identity
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    stacks: StackDescriptionList,
}

impl StaticFetcher {
    pub fn new(stacks: StackDescriptionList) -> Self {
        Self { stacks }
    }
}

#[async_trait]
impl StackFetcher for StaticFetcher {
    async fn fetch(&self, identity: &DeploymentIdentity) -> Result<StackDescriptionList, FetchError> {
        tracing::debug!(stack = %identity.stack_name(), "Using static stack description");
        Ok(self.stacks.clone())
    }
}

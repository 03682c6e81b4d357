//! Stack fetchers used by the CLI

use async_trait::async_trait;
use stackport_core::{DeploymentIdentity, StackDescriptionList};
use stackport_pipeline::{FetchError, StackFetcher};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// `aws cloudformation describe-stacks` via the AWS CLI
pub struct AwsCliFetcher;

#[async_trait]
impl StackFetcher for AwsCliFetcher {
    async fn fetch(&self, identity: &DeploymentIdentity) -> Result<StackDescriptionList, FetchError> {
        let stack = identity.stack_name();
        let args = [
            "cloudformation",
            "describe-stacks",
            "--stack-name",
            stack.as_str(),
            "--region",
            identity.region.as_str(),
            "--output",
            "json",
        ];

        let mut cmd = Command::new("aws");
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: aws {}", args.join(" "));

        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Request {
                stack,
                message: stderr.trim().to_string(),
            });
        }

        StackDescriptionList::from_json(&String::from_utf8_lossy(&output.stdout))
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}

/// Saved `describe-stacks` output
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StackFetcher for FileFetcher {
    async fn fetch(&self, identity: &DeploymentIdentity) -> Result<StackDescriptionList, FetchError> {
        tracing::debug!(
            stack = %identity.stack_name(),
            path = %self.path.display(),
            "Reading stack description from file"
        );

        let content = tokio::fs::read_to_string(&self.path).await?;
        StackDescriptionList::from_json(&content).map_err(|e| {
            FetchError::InvalidResponse(format!("{}: {}", self.path.display(), e))
        })
    }
}

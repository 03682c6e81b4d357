//! Stack description and output types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Output key holding the API endpoint of a deployed serverless stack
pub const SERVICE_ENDPOINT_KEY: &str = "ServiceEndpoint";

/// A single declared output of a deployed stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutputPair {
    pub output_key: String,
    pub output_value: String,
}

impl StackOutputPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            output_key: key.into(),
            output_value: value.into(),
        }
    }
}

/// A single stack as returned by `describe-stacks`
///
/// Stacks that declare no outputs come back without the `Outputs` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescription {
    #[serde(default)]
    pub outputs: Vec<StackOutputPair>,
}

impl StackDescription {
    pub fn new(outputs: Vec<StackOutputPair>) -> Self {
        Self { outputs }
    }
}

/// Raw `describe-stacks` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescriptionList {
    #[serde(default)]
    pub stacks: Vec<StackDescription>,
}

impl StackDescriptionList {
    pub fn new(stacks: Vec<StackDescription>) -> Self {
        Self { stacks }
    }

    /// Parse the JSON document printed by `aws cloudformation describe-stacks`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Flat output key → value mapping
///
/// Keys are kept sorted so every sink serializes the same document for the
/// same stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedOutputMap(BTreeMap<String, String>);

impl NormalizedOutputMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        self.0.insert(key, value);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NormalizedOutputMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Who is being deployed, where, and from which project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentIdentity {
    /// Service name (e.g. "orders")
    pub service: String,

    /// Stage name (e.g. "dev", "prod")
    pub stage: String,

    /// Target region (e.g. "us-east-1")
    pub region: String,

    /// Provider name as declared in the project config (e.g. "aws")
    pub provider: String,

    /// Project root; relative sink paths resolve against it
    pub service_path: PathBuf,
}

impl DeploymentIdentity {
    pub fn new(
        service: impl Into<String>,
        stage: impl Into<String>,
        region: impl Into<String>,
        provider: impl Into<String>,
        service_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            service: service.into(),
            stage: stage.into(),
            region: region.into(),
            provider: provider.into(),
            service_path: service_path.into(),
        }
    }

    /// CloudFormation stack name (`<service>-<stage>`)
    pub fn stack_name(&self) -> String {
        format!("{}-{}", self.service, self.stage)
    }

    /// Resolve a configured path against the service path
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.service_path.join(path)
        }
    }
}

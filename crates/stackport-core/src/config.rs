//! Project configuration
//!
//! stackport reads the same `serverless.yml` the deployment uses and picks up
//! its settings from `custom.discovery`.

use crate::error::{ConfigError, Result};
use crate::model::DeploymentIdentity;
use crate::template::DeploymentPropertyTemplate;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a config file
pub const CONFIG_PATH_ENV: &str = "STACKPORT_CONFIG";

const CONFIG_CANDIDATES: [&str; 3] = ["serverless.local.yml", "serverless.yml", "serverless.yaml"];

const DEFAULT_STAGE: &str = "dev";
const DEFAULT_REGION: &str = "us-east-1";

/// Top-level project document
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub service: ServiceName,

    pub provider: ProviderConfig,

    #[serde(default)]
    pub custom: CustomConfig,
}

/// `service: orders` or `service: { name: orders }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServiceName {
    Plain(String),
    Named { name: String },
}

impl ServiceName {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceName::Plain(name) => name,
            ServiceName::Named { name } => name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub name: String,

    #[serde(default)]
    pub stage: Option<String>,

    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomConfig {
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
}

/// `custom.discovery` section
///
/// Empty strings are treated as "not configured"; use the accessors rather
/// than the raw fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub discovery_service_uri: Option<String>,

    #[serde(default)]
    pub deploy_handler: Option<String>,

    #[serde(default)]
    pub remove_handler: Option<String>,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default, rename = "serviceURL", deserialize_with = "template_or_empty")]
    pub service_url: Option<DeploymentPropertyTemplate>,

    #[serde(default, rename = "externalID")]
    pub external_id: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,
}

/// `serviceURL: ""` and `serviceURL: ~` both mean "not configured"
fn template_or_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DeploymentPropertyTemplate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTemplate {
        Template(DeploymentPropertyTemplate),
        Text(String),
    }

    match Option::<RawTemplate>::deserialize(deserializer)? {
        Some(RawTemplate::Template(template)) => Ok(Some(template)),
        Some(RawTemplate::Text(text)) if text.is_empty() => Ok(None),
        Some(RawTemplate::Text(text)) => Err(serde::de::Error::custom(format!(
            "serviceURL must be a mapping of property names to values, got '{}'",
            text
        ))),
        None => Ok(None),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl DiscoveryConfig {
    pub fn discovery_service_uri(&self) -> Option<&str> {
        non_empty(&self.discovery_service_uri)
    }

    pub fn deploy_handler(&self) -> Option<&str> {
        non_empty(&self.deploy_handler)
    }

    pub fn remove_handler(&self) -> Option<&str> {
        non_empty(&self.remove_handler)
    }

    pub fn file(&self) -> Option<&str> {
        non_empty(&self.file)
    }

    pub fn service_url(&self) -> Option<&DeploymentPropertyTemplate> {
        self.service_url.as_ref()
    }

    pub fn external_id(&self) -> Option<&str> {
        non_empty(&self.external_id)
    }

    pub fn version(&self) -> Option<&str> {
        non_empty(&self.version)
    }

    pub fn access_key_id(&self) -> Option<&str> {
        non_empty(&self.access_key_id)
    }

    pub fn secret_access_key(&self) -> Option<&str> {
        non_empty(&self.secret_access_key)
    }
}

impl ProjectConfig {
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.service.as_str().is_empty() {
            return Err(ConfigError::Invalid("service name is empty".to_string()));
        }

        tracing::debug!(path = %path.display(), service = config.service.as_str(), "Loaded config");
        Ok(config)
    }

    /// Discovery settings, or defaults when the section is missing
    pub fn discovery(&self) -> DiscoveryConfig {
        self.custom.discovery.clone().unwrap_or_default()
    }

    /// Build the deployment identity, letting CLI flags override stage and region
    pub fn identity(
        &self,
        stage: Option<&str>,
        region: Option<&str>,
        service_path: impl Into<PathBuf>,
    ) -> DeploymentIdentity {
        let stage = stage
            .or(self.provider.stage.as_deref())
            .unwrap_or(DEFAULT_STAGE);
        let region = region
            .or(self.provider.region.as_deref())
            .unwrap_or(DEFAULT_REGION);

        DeploymentIdentity::new(
            self.service.as_str(),
            stage,
            region,
            &self.provider.name,
            service_path,
        )
    }
}

/// Find the project config file
///
/// Search order:
/// 1. `STACKPORT_CONFIG` environment variable
/// 2. Current directory: serverless.local.yml, serverless.yml, serverless.yaml
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "STACKPORT_CONFIG is set but file does not exist");
    }

    let current_dir = std::env::current_dir()?;
    find_config_file_in(&current_dir)
}

/// Look for a config file in a specific directory
pub fn find_config_file_in(dir: &Path) -> Result<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .ok_or(ConfigError::ConfigFileNotFound)
}

//! Registry wire types

use serde::{Deserialize, Serialize};

/// A service record as exchanged with the discovery service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    #[serde(rename = "ExternalID", default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(rename = "ServiceName")]
    pub service_name: String,

    #[serde(rename = "ServiceURL")]
    pub service_url: String,

    #[serde(rename = "StageName")]
    pub stage_name: String,

    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Assigned by the registry; never sent on create
    #[serde(rename = "ServiceID", default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

impl ServiceRegistration {
    pub fn new(
        service_name: impl Into<String>,
        stage_name: impl Into<String>,
        service_url: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            stage_name: stage_name.into(),
            service_url: service_url.into(),
            ..Default::default()
        }
    }

    pub fn with_external_id(mut self, external_id: Option<impl Into<String>>) -> Self {
        self.external_id = external_id.map(Into::into);
        self
    }

    pub fn with_version(mut self, version: Option<impl Into<String>>) -> Self {
        self.version = version.map(Into::into);
        self
    }

    /// Lookup key matching this registration
    pub fn query(&self) -> ServiceQuery {
        ServiceQuery {
            service_name: self.service_name.clone(),
            stage_name: self.stage_name.clone(),
            version: self.version.clone(),
            external_id: self.external_id.clone(),
        }
    }
}

/// Lookup key: name + stage, optionally narrowed by version and external ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceQuery {
    pub service_name: String,
    pub stage_name: String,
    pub version: Option<String>,
    pub external_id: Option<String>,
}

impl ServiceQuery {
    pub fn new(service_name: impl Into<String>, stage_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            stage_name: stage_name.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: Option<impl Into<String>>) -> Self {
        self.version = version.map(Into::into);
        self
    }

    pub fn with_external_id(mut self, external_id: Option<impl Into<String>>) -> Self {
        self.external_id = external_id.map(Into::into);
        self
    }

    /// Query string parameters in wire order
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![
            ("ServiceName", self.service_name.as_str()),
            ("StageName", self.stage_name.as_str()),
        ];
        if let Some(version) = &self.version {
            params.push(("Version", version));
        }
        if let Some(external_id) = &self.external_id {
            params.push(("ExternalID", external_id));
        }
        params
    }
}

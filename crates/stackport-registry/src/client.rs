//! Discovery service HTTP client
//!
//! Talks to the serverless discovery service catalog API:
//!
//! - `POST   {uri}/catalog/service`
//! - `GET    {uri}/catalog/service?ServiceName=..&StageName=..[&Version=..][&ExternalID=..]`
//! - `DELETE {uri}/catalog/service/{ServiceID}`

use crate::error::{RegistryError, Result};
use crate::model::{ServiceQuery, ServiceRegistration};
use crate::registry::ServiceRegistry;
use crate::sigv4;
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use stackport_core::Credentials;

const CATALOG_PATH: [&str; 2] = ["catalog", "service"];

/// Configuration for [`DiscoveryClient`]
#[derive(Debug, Clone)]
pub struct DiscoveryClientConfig {
    /// Base URI of the discovery service (e.g. the API Gateway stage URL)
    pub uri: String,

    pub credentials: Credentials,

    /// Signing region used when the URI does not name one
    pub region: String,
}

/// Discovery service client
pub struct DiscoveryClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    region: String,
}

impl DiscoveryClient {
    pub fn new(config: DiscoveryClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.uri)
            .map_err(|e| RegistryError::InvalidUri(format!("{}: {}", config.uri, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(RegistryError::InvalidUri(config.uri));
        }

        let region = sigv4::region_from_url(&base_url).unwrap_or(config.region);
        if config.credentials.is_empty() {
            tracing::warn!("No credentials available, registry requests will be rejected");
        }

        // One request per call; no idle connections are kept
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials: config.credentials,
            region,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Region requests are signed for
    pub fn region(&self) -> &str {
        &self.region
    }

    fn endpoint(&self, extra: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RegistryError::InvalidUri(self.base_url.to_string()))?;
            segments.pop_if_empty().extend(CATALOG_PATH);
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }

    /// Sign and send one request; non-2xx responses become errors
    async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<reqwest::Response> {
        let payload = body.as_deref().unwrap_or_default();
        let signed = sigv4::sign(
            method.as_str(),
            &url,
            payload,
            &self.credentials,
            &self.region,
            chrono::Utc::now(),
        );

        tracing::debug!(method = %method, url = %url, "Sending registry request");

        let mut request = self
            .client
            .request(method, url)
            .header("x-amz-date", &signed.amz_date)
            .header(reqwest::header::AUTHORIZATION, &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ServiceRegistry for DiscoveryClient {
    async fn register(&self, registration: &ServiceRegistration) -> Result<ServiceRegistration> {
        let url = self.endpoint(None)?;
        let body = serde_json::to_vec(registration)?;

        tracing::info!(
            service = %registration.service_name,
            stage = %registration.stage_name,
            "Registering service endpoint"
        );

        let response = self.send(Method::POST, url, Some(body)).await?;
        let created: ServiceRegistration = response.json().await?;
        if created.service_id.is_none() {
            return Err(RegistryError::MissingServiceId);
        }

        tracing::debug!(service_id = ?created.service_id, "Service registered");
        Ok(created)
    }

    async fn lookup(&self, query: &ServiceQuery) -> Result<Vec<ServiceRegistration>> {
        let mut url = self.endpoint(None)?;
        url.query_pairs_mut().extend_pairs(query.params());

        match self.send(Method::GET, url, None).await {
            Ok(response) => {
                let found: Vec<ServiceRegistration> = response.json().await?;
                tracing::debug!(count = found.len(), "Looked up service registrations");
                Ok(found)
            }
            Err(RegistryError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                tracing::debug!("Registry has no matching service");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, service_id: &str) -> Result<()> {
        let url = self.endpoint(Some(service_id))?;
        self.send(Method::DELETE, url, None).await?;
        tracing::debug!(service_id, "Service registration deleted");
        Ok(())
    }
}

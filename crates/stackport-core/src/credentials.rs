//! IAM credential resolution for the discovery service

use crate::config::DiscoveryConfig;
use std::fmt;

const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Credential pair used to sign registry requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Explicit config keys when both are set, process environment otherwise
    pub fn resolve(config: &DiscoveryConfig) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Same as [`Credentials::resolve`] with a custom environment lookup
    pub fn resolve_with(config: &DiscoveryConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        if let (Some(access_key_id), Some(secret_access_key)) =
            (config.access_key_id(), config.secret_access_key())
        {
            tracing::debug!("Using credentials from discovery config");
            return Self::new(access_key_id, secret_access_key);
        }

        tracing::debug!("Using credentials from environment");
        Self {
            access_key_id: env(ACCESS_KEY_ENV).unwrap_or_default(),
            secret_access_key: env(SECRET_KEY_ENV).unwrap_or_default(),
            session_token: env(SESSION_TOKEN_ENV).filter(|t| !t.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_empty() || self.secret_access_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

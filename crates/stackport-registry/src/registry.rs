//! Service registry abstraction

use crate::error::Result;
use crate::model::{ServiceQuery, ServiceRegistration};
use async_trait::async_trait;

/// Discovery service abstraction
///
/// Every call is a single attempt; nothing is retried or cached.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Create a record and return it with its assigned `ServiceID`
    ///
    /// Existing records are not consulted: registering the same identity
    /// twice creates two records.
    async fn register(&self, registration: &ServiceRegistration) -> Result<ServiceRegistration>;

    /// Find records by name and stage, narrowed by version and external ID when set
    async fn lookup(&self, query: &ServiceQuery) -> Result<Vec<ServiceRegistration>>;

    /// Delete a record by its `ServiceID`
    async fn delete(&self, service_id: &str) -> Result<()>;

    /// Remove the first record matching `query`, if there is one
    ///
    /// Returns the deleted `ServiceID`, or `None` when nothing matched.
    async fn deregister(&self, query: &ServiceQuery) -> Result<Option<String>> {
        let found = self.lookup(query).await?;

        let Some(service_id) = found.into_iter().next().and_then(|r| r.service_id) else {
            tracing::info!(
                service = %query.service_name,
                stage = %query.stage_name,
                "No registration found, nothing to deregister"
            );
            return Ok(None);
        };

        tracing::info!(service_id = %service_id, "Deleting service registration");
        self.delete(&service_id).await?;
        Ok(Some(service_id))
    }
}

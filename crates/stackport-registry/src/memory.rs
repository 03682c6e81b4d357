//! In-memory registry
//!
//! Keeps records in process and logs every call. Test double for code built
//! on [`ServiceRegistry`]; only compiled with the `test-util` feature.

use crate::error::{RegistryError, Result};
use crate::model::{ServiceQuery, ServiceRegistration};
use crate::registry::ServiceRegistry;
use async_trait::async_trait;
use std::sync::Mutex;

/// A call observed by [`InMemoryRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Register(ServiceRegistration),
    Lookup(ServiceQuery),
    Delete(String),
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<ServiceRegistration>,
    calls: Vec<RegistryCall>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    inner: Mutex<Inner>,
    fail_with: Option<u16>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with the given HTTP status
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Default::default()
        }
    }

    /// Seed an existing record; a missing `ServiceID` is assigned
    pub fn with_record(self, mut record: ServiceRegistration) -> Self {
        {
            let mut inner = self.lock();
            if record.service_id.is_none() {
                inner.next_id += 1;
                record.service_id = Some(format!("svc-{}", inner.next_id));
            }
            inner.records.push(record);
        }
        self
    }

    pub fn records(&self) -> Vec<ServiceRegistration> {
        self.lock().records.clone()
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<()> {
        match self.fail_with {
            Some(status) => Err(RegistryError::Status {
                status,
                body: "in-memory registry failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn record_matches(record: &ServiceRegistration, query: &ServiceQuery) -> bool {
    record.service_name == query.service_name
        && record.stage_name == query.stage_name
        && (query.version.is_none() || record.version == query.version)
        && (query.external_id.is_none() || record.external_id == query.external_id)
}

#[async_trait]
impl ServiceRegistry for InMemoryRegistry {
    async fn register(&self, registration: &ServiceRegistration) -> Result<ServiceRegistration> {
        self.lock()
            .calls
            .push(RegistryCall::Register(registration.clone()));
        self.check()?;

        let mut inner = self.lock();
        inner.next_id += 1;
        let mut created = registration.clone();
        created.service_id = Some(format!("svc-{}", inner.next_id));
        inner.records.push(created.clone());
        Ok(created)
    }

    async fn lookup(&self, query: &ServiceQuery) -> Result<Vec<ServiceRegistration>> {
        self.lock().calls.push(RegistryCall::Lookup(query.clone()));
        self.check()?;

        Ok(self
            .lock()
            .records
            .iter()
            .filter(|r| record_matches(r, query))
            .cloned()
            .collect())
    }

    async fn delete(&self, service_id: &str) -> Result<()> {
        self.lock()
            .calls
            .push(RegistryCall::Delete(service_id.to_string()));
        self.check()?;

        self.lock()
            .records
            .retain(|r| r.service_id.as_deref() != Some(service_id));
        Ok(())
    }
}

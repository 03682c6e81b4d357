//! Deploy/remove orchestration
//!
//! A flow validates the deployment, fetches the stack description once,
//! normalizes its outputs and then fans them out to the configured sinks on
//! the calling task. Sinks are independent: one failing never cancels or
//! rolls back another.

use crate::error::{FetchError, PipelineError, SinkError, ValidationError};
use crate::fetch::StackFetcher;
use crate::outcome::{Flow, PipelineReport, SinkKind, SinkOutcome, SinkStatus, Stage};
use stackport_core::{
    Credentials, DeploymentIdentity, DiscoveryConfig, NormalizedOutputMap, SERVICE_ENDPOINT_KEY,
    normalize, resolve,
};
use stackport_registry::{
    DiscoveryClient, DiscoveryClientConfig, ServiceQuery, ServiceRegistration, ServiceRegistry,
};
use stackport_sink::handler::invoke;
use stackport_sink::{FileSink, HandlerContext, HandlerRegistry, HandlerResolver};
use std::collections::BTreeMap;
use std::sync::Arc;

const SUPPORTED_PROVIDER: &str = "aws";

pub struct Pipeline {
    identity: DeploymentIdentity,
    discovery: DiscoveryConfig,
    fetcher: Arc<dyn StackFetcher>,
    registry: Option<Arc<dyn ServiceRegistry>>,
    handlers: Arc<dyn HandlerResolver>,
    options: BTreeMap<String, String>,
    no_deploy: bool,
}

impl Pipeline {
    /// Handlers default to command handlers rooted at the service path
    pub fn new(
        identity: DeploymentIdentity,
        discovery: DiscoveryConfig,
        fetcher: Arc<dyn StackFetcher>,
    ) -> Self {
        let handlers = HandlerRegistry::new().with_command_root(&identity.service_path);
        Self {
            identity,
            discovery,
            fetcher,
            registry: None,
            handlers: Arc::new(handlers),
            options: BTreeMap::new(),
            no_deploy: false,
        }
    }

    /// Use this registry instead of an HTTP client built from the config
    ///
    /// The registry sink still only runs when `discoveryServiceUri` is set.
    pub fn with_registry(mut self, registry: Arc<dyn ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_handlers(mut self, handlers: Arc<dyn HandlerResolver>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_no_deploy(mut self, no_deploy: bool) -> Self {
        self.no_deploy = no_deploy;
        self
    }

    pub fn identity(&self) -> &DeploymentIdentity {
        &self.identity
    }

    /// Host hook run after a successful deployment
    ///
    /// Never fails: every problem is logged once.
    #[tracing::instrument(skip(self), fields(stack = %self.identity.stack_name()))]
    pub async fn after_deploy(&self) {
        Self::log_result(self.deploy().await);
    }

    /// Host hook run before a stack is removed
    #[tracing::instrument(skip(self), fields(stack = %self.identity.stack_name()))]
    pub async fn before_remove(&self) {
        Self::log_result(self.remove().await);
    }

    fn log_result(result: Result<PipelineReport, PipelineError>) {
        match result {
            Ok(report) => report.log(),
            Err(e) if e.is_skip() => tracing::info!("{}", e.source),
            Err(e) => tracing::error!(stage = %e.stage, "Cannot process Stack Output: {}!", e.source),
        }
    }

    /// Fetch outputs without dispatching them
    pub async fn outputs(&self) -> Result<NormalizedOutputMap, PipelineError> {
        self.validate()
            .map_err(|e| PipelineError::new(Stage::Validating, e))?;
        self.fetch_outputs().await
    }

    pub async fn deploy(&self) -> Result<PipelineReport, PipelineError> {
        let outputs = Arc::new(self.outputs().await?);

        tracing::debug!(stage = %Stage::Dispatching, count = outputs.len(), "Dispatching stack outputs");
        let (registry, handler, file) = tokio::join!(
            self.register(&outputs),
            self.run_handler(self.discovery.deploy_handler(), &outputs),
            self.save_file(&outputs),
        );

        tracing::debug!(stage = %Stage::Done, "Deploy flow finished");
        Ok(PipelineReport::new(
            Flow::Deploy,
            vec![
                SinkOutcome::new(SinkKind::Registry, registry),
                SinkOutcome::new(SinkKind::Handler, handler),
                SinkOutcome::new(SinkKind::File, file),
            ],
        ))
    }

    pub async fn remove(&self) -> Result<PipelineReport, PipelineError> {
        let outputs = Arc::new(self.outputs().await?);

        tracing::debug!(stage = %Stage::Dispatching, count = outputs.len(), "Dispatching stack outputs");
        let (registry, handler) = tokio::join!(
            self.deregister(),
            self.run_handler(self.discovery.remove_handler(), &outputs),
        );

        tracing::debug!(stage = %Stage::Done, "Remove flow finished");
        Ok(PipelineReport::new(
            Flow::Remove,
            vec![
                SinkOutcome::new(SinkKind::Registry, registry),
                SinkOutcome::new(SinkKind::Handler, handler),
            ],
        ))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        tracing::debug!(stage = %Stage::Validating, "Validating deployment");

        if self.identity.provider != SUPPORTED_PROVIDER {
            return Err(ValidationError::UnsupportedProvider(
                self.identity.provider.clone(),
            ));
        }
        if self.no_deploy {
            return Err(ValidationError::SkipRequested);
        }
        if self.identity.service.is_empty() || self.identity.stage.is_empty() {
            return Err(ValidationError::InvalidIdentity(
                "service and stage must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    async fn fetch_outputs(&self) -> Result<NormalizedOutputMap, PipelineError> {
        tracing::debug!(stage = %Stage::Fetching, stack = %self.identity.stack_name(), "Describing stack");
        let stacks = self
            .fetcher
            .fetch(&self.identity)
            .await
            .map_err(|e: FetchError| PipelineError::new(Stage::Fetching, e))?;

        tracing::debug!(stage = %Stage::Normalizing, stacks = stacks.stacks.len(), "Normalizing outputs");
        Ok(normalize(&stacks))
    }

    /// Registration payload for the current deployment
    ///
    /// `ServiceURL` is the JSON rendering of the resolved `serviceURL`
    /// template, or the raw `ServiceEndpoint` output when no template is set.
    pub fn registration(
        &self,
        outputs: &NormalizedOutputMap,
    ) -> Result<ServiceRegistration, SinkError> {
        let service_url = match resolve(self.discovery.service_url(), outputs) {
            Some(resolved) => resolved.to_json_string()?,
            None => outputs
                .get(SERVICE_ENDPOINT_KEY)
                .unwrap_or_default()
                .to_string(),
        };

        Ok(
            ServiceRegistration::new(&self.identity.service, &self.identity.stage, service_url)
                .with_external_id(self.discovery.external_id())
                .with_version(self.discovery.version()),
        )
    }

    fn query(&self) -> ServiceQuery {
        ServiceQuery::new(&self.identity.service, &self.identity.stage)
            .with_version(self.discovery.version())
            .with_external_id(self.discovery.external_id())
    }

    /// `None` when no discovery service is configured
    fn registry(&self) -> Option<Result<Arc<dyn ServiceRegistry>, SinkError>> {
        let uri = self.discovery.discovery_service_uri()?;

        if let Some(registry) = &self.registry {
            return Some(Ok(registry.clone()));
        }

        let client = DiscoveryClient::new(DiscoveryClientConfig {
            uri: uri.to_string(),
            credentials: Credentials::resolve(&self.discovery),
            region: self.identity.region.clone(),
        });
        Some(
            client
                .map(|c| Arc::new(c) as Arc<dyn ServiceRegistry>)
                .map_err(SinkError::from),
        )
    }

    async fn register(&self, outputs: &NormalizedOutputMap) -> SinkStatus {
        let registry = match self.registry() {
            None => return SinkStatus::Skipped,
            Some(Ok(registry)) => registry,
            Some(Err(e)) => return SinkStatus::Failed(e),
        };

        let registration = match self.registration(outputs) {
            Ok(registration) => registration,
            Err(e) => return SinkStatus::Failed(e),
        };

        match registry.register(&registration).await {
            Ok(created) => SinkStatus::Succeeded(format!(
                "Registered {} ({}) as {}",
                created.service_name,
                created.stage_name,
                created.service_id.as_deref().unwrap_or("unknown id"),
            )),
            Err(e) => SinkStatus::Failed(e.into()),
        }
    }

    async fn deregister(&self) -> SinkStatus {
        let registry = match self.registry() {
            None => return SinkStatus::Skipped,
            Some(Ok(registry)) => registry,
            Some(Err(e)) => return SinkStatus::Failed(e),
        };

        match registry.deregister(&self.query()).await {
            Ok(Some(service_id)) => SinkStatus::Succeeded(format!("Deregistered {}", service_id)),
            Ok(None) => SinkStatus::Succeeded("No registration to remove".to_string()),
            Err(e) => SinkStatus::Failed(e.into()),
        }
    }

    async fn run_handler(&self, reference: Option<&str>, outputs: &NormalizedOutputMap) -> SinkStatus {
        let Some(reference) = reference else {
            return SinkStatus::Skipped;
        };

        let context = HandlerContext::new(self.identity.clone()).with_options(self.options.clone());
        match invoke(self.handlers.as_ref(), reference, outputs, &context).await {
            Ok(()) => SinkStatus::Succeeded(format!(
                "Stack Output processed with handler: {}",
                reference
            )),
            Err(e) => SinkStatus::Failed(e.into()),
        }
    }

    async fn save_file(&self, outputs: &NormalizedOutputMap) -> SinkStatus {
        let Some(file) = self.discovery.file() else {
            return SinkStatus::Skipped;
        };

        let path = self.identity.resolve_path(file);
        let result = match FileSink::new(&path) {
            Ok(sink) => sink.save(outputs).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => SinkStatus::Succeeded(format!(
                "Stack Output saved to file: {}",
                path.display()
            )),
            Err(e) => SinkStatus::Failed(e.into()),
        }
    }
}

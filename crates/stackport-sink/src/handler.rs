//! Handler sink
//!
//! A handler is referenced as `<module-path>.<function>`, e.g.
//! `scripts/notify.deployed`. Handlers are registered ahead of time with a
//! [`HandlerRegistry`]; nothing is loaded dynamically.

use crate::command::CommandHandler;
use crate::error::HandlerError;
use async_trait::async_trait;
use serde::Serialize;
use stackport_core::{DeploymentIdentity, NormalizedOutputMap};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, HandlerError>;

/// Parsed `<module-path>.<function>` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    module: String,
    function: String,
}

impl HandlerRef {
    /// Split on the last dot
    pub fn parse(reference: &str) -> Result<Self> {
        let (module, function) = reference
            .rsplit_once('.')
            .ok_or_else(|| HandlerError::InvalidReference(reference.to_string()))?;

        if module.is_empty() || function.is_empty() {
            return Err(HandlerError::InvalidReference(reference.to_string()));
        }

        Ok(Self {
            module: module.to_string(),
            function: function.to_string(),
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn function(&self) -> &str {
        &self.function
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.function)
    }
}

/// Caller context handed to every handler next to the outputs
#[derive(Debug, Clone, Serialize)]
pub struct HandlerContext {
    pub identity: DeploymentIdentity,

    /// Free-form options supplied by the caller (`--option key=value`)
    pub options: BTreeMap<String, String>,
}

impl HandlerContext {
    pub fn new(identity: DeploymentIdentity) -> Self {
        Self {
            identity,
            options: BTreeMap::new(),
        }
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }
}

/// A consumer of stack outputs
#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn handle(&self, outputs: &NormalizedOutputMap, context: &HandlerContext) -> Result<()>;
}

/// Maps a handler reference to something callable
pub trait HandlerResolver: Send + Sync {
    fn resolve(&self, reference: &HandlerRef) -> Result<Arc<dyn OutputHandler>>;
}

/// Adapter for plain functions and closures
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> OutputHandler for FnHandler<F>
where
    F: Fn(&NormalizedOutputMap, &HandlerContext) -> Result<()> + Send + Sync,
{
    async fn handle(&self, outputs: &NormalizedOutputMap, context: &HandlerContext) -> Result<()> {
        (self.0)(outputs, context)
    }
}

/// Handlers registered by reference
///
/// With a command root set, references that are not registered in-process
/// fall back to running `<root>/<module-path>` as a [`CommandHandler`].
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerRef, Arc<dyn OutputHandler>>,
    command_root: Option<PathBuf>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.command_root = Some(root.into());
        self
    }

    pub fn register(&mut self, reference: &str, handler: Arc<dyn OutputHandler>) -> Result<()> {
        let reference = HandlerRef::parse(reference)?;
        tracing::debug!(handler = %reference, "Registered output handler");
        self.handlers.insert(reference, handler);
        Ok(())
    }

    pub fn register_fn<F>(&mut self, reference: &str, f: F) -> Result<()>
    where
        F: Fn(&NormalizedOutputMap, &HandlerContext) -> Result<()> + Send + Sync + 'static,
    {
        self.register(reference, Arc::new(FnHandler(f)))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve(&self, reference: &HandlerRef) -> Result<Arc<dyn OutputHandler>> {
        if let Some(handler) = self.handlers.get(reference) {
            return Ok(handler.clone());
        }

        let Some(root) = &self.command_root else {
            return Err(HandlerError::Resolution {
                reference: reference.to_string(),
                reason: "no handler registered under this name".to_string(),
            });
        };

        let program = root.join(reference.module());
        if !program.is_file() {
            return Err(HandlerError::Resolution {
                reference: reference.to_string(),
                reason: format!("{} does not exist", program.display()),
            });
        }

        // Absolute: the command runs with the service directory as its cwd
        let program = program
            .canonicalize()
            .map_err(|e| HandlerError::Resolution {
                reference: reference.to_string(),
                reason: format!("{}: {}", program.display(), e),
            })?;

        Ok(Arc::new(CommandHandler::new(program, reference.function())))
    }
}

/// Resolve `reference` and run it against the outputs
pub async fn invoke(
    resolver: &dyn HandlerResolver,
    reference: &str,
    outputs: &NormalizedOutputMap,
    context: &HandlerContext,
) -> Result<()> {
    let parsed = HandlerRef::parse(reference)?;
    let handler = resolver.resolve(&parsed)?;
    handler.handle(outputs, context).await?;

    tracing::info!(handler = %parsed, "Stack Output processed with handler");
    Ok(())
}

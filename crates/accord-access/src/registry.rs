//! Controller-type registry
//!
//! A typed dispatch table from controller-type name to factory. The owning
//! database populates it at startup; the orchestrators only look types up.

use crate::controller::{AccessController, ControllerDatabase};
use crate::options::ControllerOptions;
use accord_core::{ManifestParams, OperationContext, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructor for one controller type.
#[async_trait]
pub trait ControllerFactory: Send + Sync {
    /// Build a controller bound to `db` and configured by `params`.
    async fn construct(
        &self,
        ctx: &OperationContext,
        db: Arc<dyn ControllerDatabase>,
        params: ManifestParams,
        options: &ControllerOptions,
    ) -> Result<Arc<dyn AccessController>>;
}

/// Controller-type name to factory.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, Arc<dyn ControllerFactory>>,
}

impl ControllerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `controller_type`, returning any factory it replaces.
    pub fn register(
        &mut self,
        controller_type: impl Into<String>,
        factory: Arc<dyn ControllerFactory>,
    ) -> Option<Arc<dyn ControllerFactory>> {
        let controller_type = controller_type.into();
        tracing::debug!(%controller_type, "registering access controller type");
        self.factories.insert(controller_type, factory)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(
        mut self,
        controller_type: impl Into<String>,
        factory: Arc<dyn ControllerFactory>,
    ) -> Self {
        self.register(controller_type, factory);
        self
    }

    /// Factory for `controller_type`.
    pub fn lookup(&self, controller_type: &str) -> Option<Arc<dyn ControllerFactory>> {
        self.factories.get(controller_type).cloned()
    }

    /// Whether `controller_type` is registered.
    pub fn contains(&self, controller_type: &str) -> bool {
        self.factories.contains_key(controller_type)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("types", &self.types())
            .finish()
    }
}

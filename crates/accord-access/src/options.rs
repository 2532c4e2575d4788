//! Access-controller options.

use accord_core::{AccordError, OperationContext};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options handed to every controller constructor.
///
/// Defaults: no per-call timeout, no default writers, grants cache enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerOptions {
    /// Deadline applied to each create/resolve call, on top of the caller's context.
    pub operation_timeout_ms: Option<u64>,
    /// Identities granted `write` when the params name none.
    pub default_write_access: Vec<String>,
    /// Whether controllers may read and populate the grants cache.
    pub use_grants_cache: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            operation_timeout_ms: None,
            default_write_access: Vec::new(),
            use_grants_cache: true,
        }
    }
}

impl ControllerOptions {
    /// Parse options from a TOML document.
    pub fn from_toml_str(source: &str) -> accord_core::Result<Self> {
        let options: Self = toml::from_str(source)
            .map_err(|e| AccordError::invalid(format!("controller options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values no controller can honour.
    pub fn validate(&self) -> accord_core::Result<()> {
        if self.operation_timeout_ms == Some(0) {
            return Err(AccordError::invalid(
                "operation_timeout_ms must be greater than zero",
            ));
        }
        if self.default_write_access.iter().any(|id| id.is_empty()) {
            return Err(AccordError::invalid(
                "default_write_access contains an empty identity",
            ));
        }
        Ok(())
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the default writers.
    pub fn with_default_write_access<I, S>(mut self, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_write_access = identities.into_iter().map(Into::into).collect();
        self
    }

    /// Keep controllers away from the grants cache.
    pub fn without_grants_cache(mut self) -> Self {
        self.use_grants_cache = false;
        self
    }

    /// Per-call timeout, if configured.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// The caller's context narrowed by `operation_timeout`.
    pub fn scope(&self, ctx: &OperationContext) -> OperationContext {
        match self.operation_timeout() {
            Some(timeout) => ctx.clone().with_timeout(timeout),
            None => ctx.clone(),
        }
    }
}

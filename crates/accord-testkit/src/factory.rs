//! Counting controller factory with fault injection.

use accord_access::{
    AccessController, ControllerDatabase, ControllerFactory, ControllerOptions, WRITE_ROLE,
};
use accord_core::{AccordError, ManifestAddress, ManifestParams, OperationContext, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Stage at which a [`MockControllerFactory`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `construct` returns an error
    Construct,
    /// `save` returns an error
    Save,
    /// `load` returns an error
    Load,
}

#[derive(Debug, Default)]
struct Counters {
    constructs: AtomicUsize,
    saves: AtomicUsize,
    loads: AtomicUsize,
    closes: AtomicUsize,
}

/// Factory producing [`MockController`]s and counting every call.
#[derive(Debug, Clone)]
pub struct MockControllerFactory {
    controller_type: String,
    reported_type: Option<String>,
    fault: Option<Fault>,
    delay: Option<Duration>,
    counters: Arc<Counters>,
}

impl MockControllerFactory {
    /// Factory whose controllers report `controller_type`.
    pub fn new(controller_type: impl Into<String>) -> Self {
        Self {
            controller_type: controller_type.into(),
            reported_type: None,
            fault: None,
            delay: None,
            counters: Arc::default(),
        }
    }

    /// Fail at `fault`.
    pub fn failing_at(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Controllers sleep for `delay` at the start of `save` and `load`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Controllers report `controller_type` instead of the registered one.
    pub fn reporting_type(mut self, controller_type: impl Into<String>) -> Self {
        self.reported_type = Some(controller_type.into());
        self
    }

    /// Number of `construct` calls.
    pub fn constructs(&self) -> usize {
        self.counters.constructs.load(Ordering::SeqCst)
    }

    /// Number of `save` calls on produced controllers.
    pub fn saves(&self) -> usize {
        self.counters.saves.load(Ordering::SeqCst)
    }

    /// Number of `load` calls on produced controllers.
    pub fn loads(&self) -> usize {
        self.counters.loads.load(Ordering::SeqCst)
    }

    /// Number of `close` calls on produced controllers.
    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControllerFactory for MockControllerFactory {
    async fn construct(
        &self,
        _ctx: &OperationContext,
        _db: Arc<dyn ControllerDatabase>,
        params: ManifestParams,
        _options: &ControllerOptions,
    ) -> Result<Arc<dyn AccessController>> {
        self.counters.constructs.fetch_add(1, Ordering::SeqCst);
        if self.fault == Some(Fault::Construct) {
            return Err(AccordError::invalid("mock constructor rejected params"));
        }

        Ok(Arc::new(MockController {
            controller_type: self
                .reported_type
                .clone()
                .unwrap_or_else(|| self.controller_type.clone()),
            params: Mutex::new(params),
            address: Mutex::new(None),
            fault: self.fault,
            delay: self.delay,
            counters: self.counters.clone(),
        }))
    }
}

/// Controller that stores its params verbatim.
#[derive(Debug)]
pub struct MockController {
    controller_type: String,
    params: Mutex<ManifestParams>,
    address: Mutex<Option<ManifestAddress>>,
    fault: Option<Fault>,
    delay: Option<Duration>,
    counters: Arc<Counters>,
}

impl MockController {
    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AccessController for MockController {
    fn controller_type(&self) -> &str {
        &self.controller_type
    }

    fn address(&self) -> Option<ManifestAddress> {
        *self.address.lock()
    }

    async fn save(&self, _ctx: &OperationContext) -> Result<ManifestParams> {
        self.counters.saves.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fault == Some(Fault::Save) {
            return Err(AccordError::storage("mock save failed"));
        }
        Ok(self.params.lock().clone())
    }

    async fn load(&self, _ctx: &OperationContext, address: &str) -> Result<()> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fault == Some(Fault::Load) {
            return Err(AccordError::not_found(format!("mock state for {address}")));
        }
        *self.address.lock() = address.parse().ok();
        Ok(())
    }

    async fn can_append(&self, _ctx: &OperationContext, identity: &str) -> Result<bool> {
        let params = self.params.lock();
        let writers = params.access(WRITE_ROLE);
        Ok(writers.iter().any(|id| id == identity || id == "*"))
    }

    async fn authorized_by_role(&self, _ctx: &OperationContext, role: &str) -> Result<Vec<String>> {
        Ok(self.params.lock().access(role).to_vec())
    }

    async fn grant(&self, _ctx: &OperationContext, role: &str, identity: &str) -> Result<()> {
        self.params
            .lock()
            .access
            .entry(role.to_string())
            .or_default()
            .push(identity.to_string());
        Ok(())
    }

    async fn revoke(&self, _ctx: &OperationContext, role: &str, identity: &str) -> Result<()> {
        if let Some(ids) = self.params.lock().access.get_mut(role) {
            ids.retain(|id| id != identity);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

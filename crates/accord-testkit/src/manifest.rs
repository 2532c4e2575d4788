//! Recording manifest handler.

use accord_core::{
    AccordError, BlockStoreEffects, Manifest, ManifestAddress, ManifestEffects, ManifestParams,
    OperationContext, Result,
};
use accord_effects::DagCborManifestHandler;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wraps [`DagCborManifestHandler`], counting calls and injecting faults.
#[derive(Debug, Clone, Default)]
pub struct RecordingManifestHandler {
    inner: DagCborManifestHandler,
    creates: Arc<AtomicUsize>,
    resolves: Arc<AtomicUsize>,
    fail_create: bool,
    fail_resolve: bool,
    delay: Option<Duration>,
    published: Arc<Mutex<Vec<(String, ManifestParams)>>>,
}

impl RecordingManifestHandler {
    /// Handler that delegates every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `create_manifest` fails with a storage error.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Every `resolve_manifest` fails with a storage error.
    pub fn failing_resolve(mut self) -> Self {
        self.fail_resolve = true;
        self
    }

    /// Sleep for `delay` before delegating each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `create_manifest` calls.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `resolve_manifest` calls.
    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    /// Manifests that were successfully published, in order.
    pub fn published(&self) -> Vec<(String, ManifestParams)> {
        self.published.lock().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ManifestEffects for RecordingManifestHandler {
    async fn create_manifest(
        &self,
        ctx: &OperationContext,
        store: &dyn BlockStoreEffects,
        controller_type: &str,
        params: &ManifestParams,
    ) -> Result<ManifestAddress> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_create {
            return Err(AccordError::storage("injected publish failure"));
        }

        let address = self
            .inner
            .create_manifest(ctx, store, controller_type, params)
            .await?;
        self.published
            .lock()
            .push((controller_type.to_string(), params.clone()));
        Ok(address)
    }

    async fn resolve_manifest(
        &self,
        ctx: &OperationContext,
        store: &dyn BlockStoreEffects,
        address: &str,
        hint: &ManifestParams,
    ) -> Result<Manifest> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_resolve {
            return Err(AccordError::storage("injected resolve failure"));
        }

        self.inner.resolve_manifest(ctx, store, address, hint).await
    }
}

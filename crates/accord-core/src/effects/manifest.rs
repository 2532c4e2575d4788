//! Manifest publication and resolution interface

use super::BlockStoreEffects;
use crate::context::OperationContext;
use crate::errors::Result;
use crate::manifest::{Manifest, ManifestAddress, ManifestParams};
use async_trait::async_trait;

/// Publishes and resolves access-controller manifests.
///
/// Address encoding and manifest byte layout belong to the implementation.
#[async_trait]
pub trait ManifestEffects: Send + Sync {
    /// Publish `(controller_type, params)` and return its content address
    async fn create_manifest(
        &self,
        ctx: &OperationContext,
        store: &dyn BlockStoreEffects,
        controller_type: &str,
        params: &ManifestParams,
    ) -> Result<ManifestAddress>;

    /// Fetch the manifest at `address`, using `hint` to disambiguate
    async fn resolve_manifest(
        &self,
        ctx: &OperationContext,
        store: &dyn BlockStoreEffects,
        address: &str,
        hint: &ManifestParams,
    ) -> Result<Manifest>;
}

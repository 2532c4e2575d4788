//! DAG-CBOR manifest handler
//!
//! Manifests are encoded as canonical DAG-CBOR and stored as a single block;
//! the block hash is the manifest address. Resolution re-hashes the fetched
//! bytes so a store returning the wrong block cannot substitute a policy.

use accord_core::{
    AccordError, BlockStoreEffects, Hash32, Manifest, ManifestAddress, ManifestEffects,
    ManifestParams, OperationContext, Result,
};
use async_trait::async_trait;
use tracing::debug;

/// Reference [`ManifestEffects`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagCborManifestHandler;

impl DagCborManifestHandler {
    /// Create a handler
    pub fn new() -> Self {
        Self
    }
}

fn check(ctx: &OperationContext) -> Result<()> {
    ctx.check()
        .map_err(|cause| AccordError::cancelled(cause.to_string()))
}

#[async_trait]
impl ManifestEffects for DagCborManifestHandler {
    async fn create_manifest(
        &self,
        ctx: &OperationContext,
        store: &dyn BlockStoreEffects,
        controller_type: &str,
        params: &ManifestParams,
    ) -> Result<ManifestAddress> {
        if params.skip_manifest {
            return params
                .pre_supplied_address()
                .ok_or_else(|| AccordError::invalid("skip_manifest requires an address"));
        }
        if controller_type.is_empty() {
            return Err(AccordError::invalid("manifest requires a controller type"));
        }
        check(ctx)?;

        let bytes = Manifest::new(controller_type, params.clone()).encode()?;
        let hash = store.put_block(bytes).await?;
        let address = ManifestAddress::from(hash);
        debug!(%address, %controller_type, "manifest stored");
        Ok(address)
    }

    async fn resolve_manifest(
        &self,
        ctx: &OperationContext,
        store: &dyn BlockStoreEffects,
        address: &str,
        hint: &ManifestParams,
    ) -> Result<Manifest> {
        if hint.skip_manifest {
            let controller_type = hint
                .controller_type
                .clone()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    AccordError::invalid("no manifest, access controller type required")
                })?;
            let params = ManifestParams {
                address: hint.address.or_else(|| address.parse().ok()),
                ..ManifestParams::default()
            };
            return Ok(Manifest::new(controller_type, params));
        }

        let manifest_address: ManifestAddress = address.parse()?;
        check(ctx)?;

        let bytes = store
            .get_block(manifest_address.hash())
            .await?
            .ok_or_else(|| AccordError::not_found(format!("manifest {manifest_address}")))?;

        if Hash32::from_bytes(&bytes) != *manifest_address.hash() {
            return Err(AccordError::storage(format!(
                "block content does not hash to manifest {manifest_address}"
            )));
        }

        let manifest = Manifest::decode(&bytes)?;
        debug!(address = %manifest_address, controller_type = %manifest.controller_type, "manifest resolved");
        Ok(manifest)
    }
}

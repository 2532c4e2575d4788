//! Create and resolve orchestration
//!
//! `create` turns a controller type and params into a published manifest
//! address; `resolve` turns a manifest address back into a live controller.
//! Both walk the same stage sequence:
//!
//! ```text
//! TYPE_LOOKUP -> CONSTRUCT -> SAVE -> PUBLISH   (create)
//! RESOLVE -> TYPE_LOOKUP -> CONSTRUCT -> LOAD   (resolve)
//! ```
//!
//! Any stage failure ends the call with a [`ControllerError`]; nothing is
//! retried and there is no fallback controller. Each suspension point is
//! raced against the operation context, so cancellation drops the in-flight
//! collaborator call and no address or controller escapes.

use crate::controller::{AccessController, ControllerDatabase};
use crate::errors::{ControllerError, Operation, Stage};
use crate::options::ControllerOptions;
use accord_core::context::CancelCause;
use accord_core::{
    AccordError, ManifestAddress, ManifestEffects, ManifestParams, OperationContext,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Entry point for creating and resolving access controllers.
#[derive(Clone)]
pub struct AccessControllerManager {
    manifests: Arc<dyn ManifestEffects>,
}

impl AccessControllerManager {
    /// Manager publishing and resolving through `manifests`.
    pub fn new(manifests: Arc<dyn ManifestEffects>) -> Self {
        Self { manifests }
    }

    /// Construct a controller of `controller_type`, save it and publish its
    /// manifest. Params requesting a skipped manifest short-circuit to their
    /// pre-supplied address without constructing anything.
    #[instrument(
        skip_all,
        fields(database = %db.name(), controller_type = %controller_type)
    )]
    pub async fn create(
        &self,
        ctx: &OperationContext,
        db: Arc<dyn ControllerDatabase>,
        controller_type: &str,
        params: ManifestParams,
        options: &ControllerOptions,
    ) -> Result<ManifestAddress, ControllerError> {
        let factory = db.controller_type(controller_type).ok_or_else(|| {
            warn!("unrecognized access controller type on create");
            ControllerError::UnrecognizedControllerType {
                controller_type: controller_type.to_string(),
                operation: Operation::Create,
            }
        })?;

        if params.skip_manifest {
            return match params.pre_supplied_address() {
                Some(address) => {
                    debug!(%address, "manifest skipped, using supplied address");
                    Ok(address)
                }
                None => Err(ControllerError::InvalidParams {
                    reason: "skip_manifest requires an address".to_string(),
                }),
            };
        }

        let ctx = options.scope(ctx);

        debug!(stage = %Stage::Construct, "constructing access controller");
        let controller = suspend(
            &ctx,
            Stage::Construct,
            factory.construct(&ctx, db.clone(), params, options),
            |source| ControllerError::ConstructionFailed {
                controller_type: controller_type.to_string(),
                source,
            },
        )
        .await?;

        debug!(stage = %Stage::Save, "saving access controller");
        let saved = suspend(&ctx, Stage::Save, controller.save(&ctx), |source| {
            ControllerError::SaveFailed {
                controller_type: controller_type.to_string(),
                source,
            }
        })
        .await?;

        debug!(stage = %Stage::Publish, "publishing manifest");
        let store = db.block_store();
        let address = suspend(
            &ctx,
            Stage::Publish,
            self.manifests
                .create_manifest(&ctx, store.as_ref(), controller_type, &saved),
            |source| ControllerError::PublishFailed {
                controller_type: controller_type.to_string(),
                source,
            },
        )
        .await?;

        debug!(%address, "access controller created");
        Ok(address)
    }

    /// Fetch the manifest at `address` and rebuild the controller it names.
    ///
    /// The controller is constructed from the manifest's own params; `hint`
    /// is only given to the manifest protocol. Unknown types fail closed.
    #[instrument(skip_all, fields(database = %db.name(), address = %address))]
    pub async fn resolve(
        &self,
        ctx: &OperationContext,
        db: Arc<dyn ControllerDatabase>,
        address: &str,
        hint: &ManifestParams,
        options: &ControllerOptions,
    ) -> Result<Arc<dyn AccessController>, ControllerError> {
        let ctx = options.scope(ctx);

        debug!(stage = %Stage::Resolve, "resolving manifest");
        let store = db.block_store();
        let manifest = suspend(
            &ctx,
            Stage::Resolve,
            self.manifests
                .resolve_manifest(&ctx, store.as_ref(), address, hint),
            |source| ControllerError::ManifestResolutionFailed {
                address: address.to_string(),
                source,
            },
        )
        .await?;

        let controller_type = manifest.controller_type.as_str();
        let factory = db.controller_type(controller_type).ok_or_else(|| {
            warn!(%controller_type, "unrecognized access controller type on resolve");
            ControllerError::UnrecognizedControllerType {
                controller_type: controller_type.to_string(),
                operation: Operation::Resolve,
            }
        })?;

        debug!(stage = %Stage::Construct, %controller_type, "constructing access controller");
        let controller = suspend(
            &ctx,
            Stage::Construct,
            factory.construct(&ctx, db.clone(), manifest.params.clone(), options),
            |source| ControllerError::ConstructionFailed {
                controller_type: controller_type.to_string(),
                source,
            },
        )
        .await?;

        let load_address = canonical_address(address);
        debug!(stage = %Stage::Load, %controller_type, "loading access controller");
        let loaded = suspend(
            &ctx,
            Stage::Load,
            controller.load(&ctx, &load_address),
            |source| ControllerError::LoadFailed {
                controller_type: controller_type.to_string(),
                address: load_address.clone(),
                source,
            },
        )
        .await
        .and_then(|()| verify_binding(controller.as_ref(), controller_type, &load_address));

        if let Err(err) = loaded {
            discard(controller.as_ref()).await;
            return Err(err);
        }

        debug!(%controller_type, "access controller resolved");
        Ok(controller)
    }
}

/// Run one suspension point under `ctx`, classifying its outcome.
async fn suspend<T, F, W>(
    ctx: &OperationContext,
    stage: Stage,
    fut: F,
    wrap: W,
) -> Result<T, ControllerError>
where
    F: Future<Output = accord_core::Result<T>>,
    W: FnOnce(AccordError) -> ControllerError,
{
    let err = match ctx.run(fut).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(source)) if source.is_cancelled() => ControllerError::Cancelled {
            stage,
            cause: ctx.check().err().unwrap_or(CancelCause::Requested),
            source: Some(source),
        },
        Ok(Err(source)) => wrap(source),
        Err(cause) => ControllerError::Cancelled {
            stage,
            cause,
            source: None,
        },
    };

    warn!(%stage, error = %err, "access controller stage failed");
    Err(err)
}

/// Canonical hex form of `address` when it parses, the raw string otherwise.
fn canonical_address(address: &str) -> String {
    address
        .parse::<ManifestAddress>()
        .map_or_else(|_| address.to_string(), |parsed| parsed.to_string())
}

fn verify_binding(
    controller: &dyn AccessController,
    controller_type: &str,
    address: &str,
) -> Result<(), ControllerError> {
    if controller.controller_type() != controller_type {
        return Err(ControllerError::ManifestMismatch {
            address: address.to_string(),
            reason: format!(
                "controller reports type `{}`, manifest declares `{controller_type}`",
                controller.controller_type()
            ),
        });
    }

    if let (Some(reported), Ok(expected)) =
        (controller.address(), address.parse::<ManifestAddress>())
    {
        if reported != expected {
            return Err(ControllerError::ManifestMismatch {
                address: address.to_string(),
                reason: format!("controller reports address `{reported}`"),
            });
        }
    }

    Ok(())
}

async fn discard(controller: &dyn AccessController) {
    if let Err(err) = controller.close().await {
        debug!(error = %err, "closing discarded access controller failed");
    }
}

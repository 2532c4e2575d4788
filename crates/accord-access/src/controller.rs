//! Access-controller and owning-database interfaces
//!
//! These are the collaborator contracts the orchestrators consume. Policy
//! logic lives entirely behind [`AccessController`]; the orchestrators only
//! call `controller_type`, `address`, `save` and `load`.

use crate::cache::GrantsCache;
use crate::registry::ControllerFactory;
use accord_core::{BlockStoreEffects, ManifestAddress, ManifestParams, OperationContext, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Role name that allows appending entries.
pub const WRITE_ROLE: &str = "write";

/// Role name that allows changing grants.
pub const ADMIN_ROLE: &str = "admin";

/// Live permission policy bound to one database and one manifest.
#[async_trait]
pub trait AccessController: Send + Sync + fmt::Debug {
    /// Registered type name.
    fn controller_type(&self) -> &str;

    /// Manifest address this controller was loaded from, once loaded.
    fn address(&self) -> Option<ManifestAddress>;

    /// Serialize the controller state into manifest params.
    async fn save(&self, ctx: &OperationContext) -> Result<ManifestParams>;

    /// Restore state for the manifest at `address`.
    async fn load(&self, ctx: &OperationContext, address: &str) -> Result<()>;

    /// Whether `identity` may append entries.
    async fn can_append(&self, ctx: &OperationContext, identity: &str) -> Result<bool>;

    /// Identities holding `role`.
    async fn authorized_by_role(&self, ctx: &OperationContext, role: &str) -> Result<Vec<String>>;

    /// Give `identity` the `role`.
    async fn grant(&self, ctx: &OperationContext, role: &str, identity: &str) -> Result<()>;

    /// Take `role` away from `identity`.
    async fn revoke(&self, ctx: &OperationContext, role: &str, identity: &str) -> Result<()>;

    /// Release resources held by the controller.
    async fn close(&self) -> Result<()>;
}

/// Handle to the database that owns access controllers.
pub trait ControllerDatabase: Send + Sync {
    /// Logical database name, also the grants cache key.
    fn name(&self) -> &str;

    /// Identity id of the local peer.
    fn identity(&self) -> &str;

    /// Registry lookup of a controller constructor.
    fn controller_type(&self, controller_type: &str) -> Option<Arc<dyn ControllerFactory>>;

    /// Content-addressed storage manifests are published to.
    fn block_store(&self) -> Arc<dyn BlockStoreEffects>;

    /// Grants cache shared by this database's controllers.
    fn grants_cache(&self) -> Arc<GrantsCache>;
}

//! In-memory role-list controller backed by the grants cache.
//!
//! Writers are taken from the params' `write` role, then the options'
//! default writers, then the database's own identity. The controller
//! populates the grants cache on load, answers `can_append` from the cache
//! first, and invalidates the cache entry whenever a write grant changes.

use accord_access::{
    AccessController, ControllerDatabase, ControllerFactory, ControllerOptions, GrantsCache,
    WRITE_ROLE,
};
use accord_core::{AccordError, ManifestAddress, ManifestParams, OperationContext, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry name of [`SimpleAccessController`].
pub const SIMPLE_CONTROLLER_TYPE: &str = "simple";

/// Wildcard identity that matches everyone.
pub const ANY_IDENTITY: &str = "*";

/// Factory for [`SimpleAccessController`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleControllerFactory;

#[async_trait]
impl ControllerFactory for SimpleControllerFactory {
    async fn construct(
        &self,
        _ctx: &OperationContext,
        db: Arc<dyn ControllerDatabase>,
        params: ManifestParams,
        options: &ControllerOptions,
    ) -> Result<Arc<dyn AccessController>> {
        let mut writers = params.access(WRITE_ROLE).to_vec();
        if writers.is_empty() {
            writers.clone_from(&options.default_write_access);
        }
        if writers.is_empty() {
            writers.push(db.identity().to_string());
        }
        if writers.iter().any(String::is_empty) {
            return Err(AccordError::invalid("write access contains an empty identity"));
        }

        let mut access = params.access;
        access.insert(WRITE_ROLE.to_string(), writers);

        Ok(Arc::new(SimpleAccessController {
            database: db.name().to_string(),
            name: params.name,
            cache: options.use_grants_cache.then(|| db.grants_cache()),
            state: RwLock::new(State {
                access,
                address: None,
                closed: false,
            }),
        }))
    }
}

#[derive(Debug)]
struct State {
    access: BTreeMap<String, Vec<String>>,
    address: Option<ManifestAddress>,
    closed: bool,
}

/// Role lists held in memory.
#[derive(Debug)]
pub struct SimpleAccessController {
    database: String,
    name: Option<String>,
    cache: Option<Arc<GrantsCache>>,
    state: RwLock<State>,
}

impl SimpleAccessController {
    fn ensure_open(&self) -> Result<()> {
        if self.state.read().closed {
            return Err(AccordError::invalid("access controller is closed"));
        }
        Ok(())
    }

    /// Current writers, refreshing the cache entry under the state read guard.
    fn refresh(&self) -> Vec<String> {
        let state = self.state.read();
        let writers = state.writers();
        if let Some(cache) = &self.cache {
            cache.put(self.database.clone(), writers.clone());
        }
        writers
    }

    /// Apply `change` to the role map; drops the cache entry under the same
    /// write guard when the write role is touched.
    fn update(&self, role: &str, change: impl FnOnce(&mut BTreeMap<String, Vec<String>>)) {
        let mut state = self.state.write();
        change(&mut state.access);
        if role == WRITE_ROLE {
            if let Some(cache) = &self.cache {
                cache.delete(&self.database);
            }
        }
    }
}

impl State {
    fn writers(&self) -> Vec<String> {
        self.access.get(WRITE_ROLE).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AccessController for SimpleAccessController {
    fn controller_type(&self) -> &str {
        SIMPLE_CONTROLLER_TYPE
    }

    fn address(&self) -> Option<ManifestAddress> {
        self.state.read().address
    }

    async fn save(&self, _ctx: &OperationContext) -> Result<ManifestParams> {
        let state = self.state.read();
        Ok(ManifestParams {
            controller_type: Some(SIMPLE_CONTROLLER_TYPE.to_string()),
            name: self.name.clone(),
            access: state.access.clone(),
            ..ManifestParams::default()
        })
    }

    async fn load(&self, _ctx: &OperationContext, address: &str) -> Result<()> {
        let address: ManifestAddress = address.parse()?;
        self.state.write().address = Some(address);
        self.refresh();
        tracing::debug!(database = %self.database, %address, "simple access controller loaded");
        Ok(())
    }

    async fn can_append(&self, _ctx: &OperationContext, identity: &str) -> Result<bool> {
        self.ensure_open()?;

        let writers = match self.cache.as_ref().and_then(|cache| cache.get(&self.database)) {
            Some(cached) => cached,
            None => self.refresh(),
        };

        Ok(writers
            .iter()
            .any(|id| id == identity || id == ANY_IDENTITY))
    }

    async fn authorized_by_role(&self, _ctx: &OperationContext, role: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .read()
            .access
            .get(role)
            .cloned()
            .unwrap_or_default())
    }

    async fn grant(&self, _ctx: &OperationContext, role: &str, identity: &str) -> Result<()> {
        self.ensure_open()?;
        if identity.is_empty() {
            return Err(AccordError::invalid("cannot grant an empty identity"));
        }

        self.update(role, |access| {
            let ids = access.entry(role.to_string()).or_default();
            if !ids.iter().any(|id| id == identity) {
                ids.push(identity.to_string());
            }
        });
        Ok(())
    }

    async fn revoke(&self, _ctx: &OperationContext, role: &str, identity: &str) -> Result<()> {
        self.ensure_open()?;

        self.update(role, |access| {
            if let Some(ids) = access.get_mut(role) {
                ids.retain(|id| id != identity);
            }
        });
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.write().closed = true;
        Ok(())
    }
}

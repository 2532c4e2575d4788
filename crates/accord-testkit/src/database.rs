//! Mock owning database.

use accord_access::{ControllerDatabase, ControllerFactory, ControllerRegistry, GrantsCache};
use accord_core::BlockStoreEffects;
use accord_effects::MemoryBlockStore;
use std::sync::Arc;

/// In-memory [`ControllerDatabase`] with a fixed registry.
pub struct MockDatabase {
    name: String,
    identity: String,
    registry: ControllerRegistry,
    block_store: Arc<dyn BlockStoreEffects>,
    grants_cache: Arc<GrantsCache>,
}

impl MockDatabase {
    /// Start building a database called `name`.
    pub fn builder(name: impl Into<String>) -> MockDatabaseBuilder {
        MockDatabaseBuilder {
            name: name.into(),
            identity: "local-identity".to_string(),
            registry: ControllerRegistry::new(),
            block_store: None,
            grants_cache: None,
        }
    }

    /// Upcast for orchestrator calls.
    pub fn handle(self: &Arc<Self>) -> Arc<dyn ControllerDatabase> {
        self.clone()
    }
}

impl ControllerDatabase for MockDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn controller_type(&self, controller_type: &str) -> Option<Arc<dyn ControllerFactory>> {
        self.registry.lookup(controller_type)
    }

    fn block_store(&self) -> Arc<dyn BlockStoreEffects> {
        self.block_store.clone()
    }

    fn grants_cache(&self) -> Arc<GrantsCache> {
        self.grants_cache.clone()
    }
}

/// Builder for [`MockDatabase`].
pub struct MockDatabaseBuilder {
    name: String,
    identity: String,
    registry: ControllerRegistry,
    block_store: Option<Arc<dyn BlockStoreEffects>>,
    grants_cache: Option<Arc<GrantsCache>>,
}

impl MockDatabaseBuilder {
    /// Local identity id.
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Register a controller type.
    pub fn register(
        mut self,
        controller_type: impl Into<String>,
        factory: Arc<dyn ControllerFactory>,
    ) -> Self {
        self.registry.register(controller_type, factory);
        self
    }

    /// Share a block store, e.g. between two peers.
    pub fn block_store(mut self, store: Arc<dyn BlockStoreEffects>) -> Self {
        self.block_store = Some(store);
        self
    }

    /// Share a grants cache.
    pub fn grants_cache(mut self, cache: Arc<GrantsCache>) -> Self {
        self.grants_cache = Some(cache);
        self
    }

    /// Finish; unset stores and caches are fresh instances.
    pub fn build(self) -> Arc<MockDatabase> {
        Arc::new(MockDatabase {
            name: self.name,
            identity: self.identity,
            registry: self.registry,
            block_store: self
                .block_store
                .unwrap_or_else(|| Arc::new(MemoryBlockStore::new())),
            grants_cache: self.grants_cache.unwrap_or_default(),
        })
    }
}

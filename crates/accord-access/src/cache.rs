//! Grants cache
//!
//! Maps a database name to the ordered list of identity ids currently known
//! to hold access to it. The cache is a memoization of a lookup performed by
//! controllers, never an authority: a miss means "ask the controller", and
//! controllers are responsible for invalidating entries when grants change.
//!
//! Names are spread over independently locked shards so that databases with
//! different names do not contend on a single lock. Every operation on one
//! name holds exactly one shard lock, which makes it atomic with respect to
//! other operations on that name.

use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Shard count used by [`GrantsCache::new`].
pub const DEFAULT_SHARDS: usize = 16;

type Shard = RwLock<HashMap<String, Vec<String>>>;

/// Concurrency-safe database name to granted identities map.
pub struct GrantsCache {
    shards: Box<[Shard]>,
}

impl GrantsCache {
    /// Create a cache with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a cache with `count` shards (at least one).
    pub fn with_shards(count: usize) -> Self {
        let shards = (0..count.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }

    fn shard(&self, name: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    /// Overwrite the grants cached for `name`.
    pub fn put(&self, name: impl Into<String>, grants: Vec<String>) {
        let name = name.into();
        tracing::trace!(database = %name, grants = grants.len(), "caching grants");
        self.shard(&name).write().insert(name, grants);
    }

    /// Cached grants for `name`, `None` on a miss.
    pub fn get(&self, name: &str) -> Option<Vec<String>> {
        self.shard(name).read().get(name).cloned()
    }

    /// Drop the entry for `name`. Absent names are ignored.
    pub fn delete(&self, name: &str) {
        if self.shard(name).write().remove(name).is_some() {
            tracing::trace!(database = %name, "invalidated cached grants");
        }
    }

    /// Whether an entry exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.shard(name).read().contains_key(name)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    /// Number of cached databases.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Whether no database is cached.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Number of lock shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

impl Default for GrantsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GrantsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrantsCache")
            .field("shards", &self.shards.len())
            .field("entries", &self.len())
            .finish()
    }
}

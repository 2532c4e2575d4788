//! In-memory block store

use accord_core::{BlockStoreEffects, Hash32, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Content-addressed block store held in memory.
///
/// Clones share the same blocks, so one store can back several databases.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlockStore {
    blocks: Arc<RwLock<HashMap<Hash32, Vec<u8>>>>,
}

impl MemoryBlockStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `hash` without checking that it matches.
    ///
    /// Only useful for exercising integrity checks in readers.
    pub async fn insert_unchecked(&self, hash: Hash32, data: Vec<u8>) {
        self.blocks.write().await.insert(hash, data);
    }

    /// Number of stored blocks
    pub async fn len(&self) -> usize {
        self.blocks.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.blocks.read().await.is_empty()
    }
}

#[async_trait]
impl BlockStoreEffects for MemoryBlockStore {
    async fn put_block(&self, data: Vec<u8>) -> Result<Hash32> {
        let hash = Hash32::from_bytes(&data);
        let mut blocks = self.blocks.write().await;
        blocks.entry(hash).or_insert(data);
        Ok(hash)
    }

    async fn get_block(&self, hash: &Hash32) -> Result<Option<Vec<u8>>> {
        let blocks = self.blocks.read().await;
        Ok(blocks.get(hash).cloned())
    }

    async fn has_block(&self, hash: &Hash32) -> Result<bool> {
        let blocks = self.blocks.read().await;
        Ok(blocks.contains_key(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_is_content_addressed() {
        let store = MemoryBlockStore::new();
        let a = store.put_block(b"grants".to_vec()).await.unwrap();
        let b = store.put_block(b"grants".to_vec()).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a, Hash32::from_bytes(b"grants"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_block() {
        let store = MemoryBlockStore::new();
        let hash = Hash32::from_bytes(b"absent");
        assert_eq!(store.get_block(&hash).await.unwrap(), None);
        assert!(!store.has_block(&hash).await.unwrap());
    }
}

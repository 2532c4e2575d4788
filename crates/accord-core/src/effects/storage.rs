//! Content-addressed block storage interface

use crate::errors::Result;
use crate::hash::Hash32;
use async_trait::async_trait;

/// Stores and retrieves arbitrary byte payloads by their content hash.
///
/// Handlers own retry and durability policy; callers see a single attempt.
#[async_trait]
pub trait BlockStoreEffects: Send + Sync {
    /// Store a block and return its content hash
    async fn put_block(&self, data: Vec<u8>) -> Result<Hash32>;

    /// Fetch a block by content hash, `None` when absent
    async fn get_block(&self, hash: &Hash32) -> Result<Option<Vec<u8>>>;

    /// Whether a block with this hash is stored
    async fn has_block(&self, hash: &Hash32) -> Result<bool> {
        Ok(self.get_block(hash).await?.is_some())
    }
}

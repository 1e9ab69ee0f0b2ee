//! Side cache for document snapshots, keyed by document id.
//!
//! The cache is a lossy accelerator in front of the document store. Values are
//! opaque byte blobs; backends never look inside them.

mod memory;
mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use async_trait::async_trait;
use uuid::Uuid;

/// Errors raised by a cache backend. Never surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache pool error: {0}")]
    Pool(String),

    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("cache call timed out")]
    Timeout,
}

#[async_trait]
pub trait DocumentCache: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Vec<u8>>, CacheError>;

    async fn put(&self, id: Uuid, value: Vec<u8>) -> Result<(), CacheError>;

    /// Removes the entry. Removing an absent entry is not an error.
    async fn invalidate(&self, id: Uuid) -> Result<(), CacheError>;

    async fn exists(&self, id: Uuid) -> Result<bool, CacheError>;

    /// Backend name reported by the health endpoint.
    fn name(&self) -> &'static str;

    async fn is_available(&self) -> bool {
        true
    }
}

//! In-process cache backend, used when Redis is disabled.
//!
//! Holds at most `max_entries` snapshots. When full, expired entries are
//! dropped first, then the oldest insertion.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{CacheError, DocumentCache};

const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    /// Insertion order, for evicting the oldest entry.
    seq: u64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Document cache held in a map behind an async `RwLock`.
///
/// With no TTL entries live until invalidated.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<Uuid, Entry>>,
    ttl: Option<Duration>,
    max_entries: usize,
    next_seq: AtomicU64,
}

impl MemoryCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Removes all expired entries, returning how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Sweeps expired entries every `every` until the runtime shuts down.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = cache.cleanup_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept expired cache entries");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentCache for MemoryCache {
    async fn get(&self, id: Uuid) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&id)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.data.clone()))
    }

    async fn put(&self, id: Uuid, value: Vec<u8>) -> Result<(), CacheError> {
        let now = Instant::now();
        let entry = Entry {
            data: value,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            expires_at: self.ttl.map(|ttl| now + ttl),
        };

        let mut entries = self.entries.write().await;
        if !entries.contains_key(&id) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| !entry.is_expired(now));
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.seq)
                    .map(|(key, _)| *key);
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(id, entry);
        Ok(())
    }

    async fn invalidate(&self, id: Uuid) -> Result<(), CacheError> {
        self.entries.write().await.remove(&id);
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, CacheError> {
        Ok(self.get(id).await?.is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

//! Redis cache backend.
//!
//! Snapshots are stored as plain string values under `{prefix}{document id}`.
//! Every call is bounded by the configured timeout; an elapsed timeout is a
//! [`CacheError::Timeout`].

use async_trait::async_trait;
use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use super::{CacheError, DocumentCache};
use crate::config::CacheConfig;

#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
    key_prefix: String,
    ttl: Option<Duration>,
    timeout: Duration,
}

impl RedisCache {
    /// Builds the connection pool. Connections are opened lazily.
    pub fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let mut redis_config = deadpool_redis::Config::from_url(config.url());

        let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = Some(config.timeout());
        pool_config.timeouts.create = Some(config.timeout());
        pool_config.timeouts.recycle = Some(config.timeout());
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Pool(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone(),
            ttl: config.ttl(),
            timeout: config.timeout(),
        })
    }

    fn key(&self, id: Uuid) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Pool(e.to_string()))
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CacheError::Timeout)?
    }
}

#[async_trait]
impl DocumentCache for RedisCache {
    async fn get(&self, id: Uuid) -> Result<Option<Vec<u8>>, CacheError> {
        let key = self.key(id);
        self.bounded(async {
            let mut conn = self.connection().await?;
            let value: Option<Vec<u8>> = conn.get(&key).await?;
            tracing::debug!(key = %key, hit = value.is_some(), "cache get");
            Ok(value)
        })
        .await
    }

    async fn put(&self, id: Uuid, value: Vec<u8>) -> Result<(), CacheError> {
        let key = self.key(id);
        self.bounded(async {
            let mut conn = self.connection().await?;
            match self.ttl {
                Some(ttl) => conn.set_ex::<_, _, ()>(&key, value, ttl.as_secs().max(1)).await?,
                None => conn.set::<_, _, ()>(&key, value).await?,
            }
            tracing::debug!(key = %key, "cache set");
            Ok(())
        })
        .await
    }

    async fn invalidate(&self, id: Uuid) -> Result<(), CacheError> {
        let key = self.key(id);
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.del::<_, ()>(&key).await?;
            tracing::debug!(key = %key, "cache invalidated");
            Ok(())
        })
        .await
    }

    async fn exists(&self, id: Uuid) -> Result<bool, CacheError> {
        let key = self.key(id);
        self.bounded(async {
            let mut conn = self.connection().await?;
            Ok(conn.exists::<_, bool>(&key).await?)
        })
        .await
    }

    fn name(&self) -> &'static str {
        "redis"
    }

    async fn is_available(&self) -> bool {
        self.bounded(self.connection()).await.is_ok()
    }
}

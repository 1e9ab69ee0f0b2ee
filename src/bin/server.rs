//! Docshelf server
//!
//! Serves role-aware documents over HTTP, with a read-through cache in
//! front of the SQLite store.
//!
//! # Configuration
//!
//! Loaded from `~/.config/docshelf/config.yaml` (or the path in
//! `DOCSHELF_CONFIG`), then overridden by environment variables:
//! - `DOCSHELF_PORT`: Port to listen on (default: 8080)
//! - `DOCSHELF_DATABASE_PATH`: SQLite database file
//! - `DOCSHELF_CACHE_ENABLED`: `false` uses the in-process cache
//! - `DOCSHELF_CACHE_HOST`, `DOCSHELF_CACHE_PORT`, `DOCSHELF_CACHE_TTL_SECS`,
//!   `DOCSHELF_CACHE_MAX_ENTRIES`
//! - `DOCSHELF_ADMIN_ROLE`: Title of the administrator role (default: admin)
//!
//! # Config File Format
//!
//! ```yaml
//! port: 8080
//! database_path: /var/lib/docshelf/docshelf.db
//! cache:
//!   host: 127.0.0.1
//!   port: 6379
//!   ttl_secs: 300
//!   max_entries: 10000
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docshelf::cache::{DocumentCache, MemoryCache, RedisCache};
use docshelf::config::{CacheConfig, Config};
use docshelf::db::init_db;
use docshelf::http::{router, AppState};

const TOKEN_CLEANUP_INTERVAL: Duration = Duration::from_secs(600);
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process cache with a background task sweeping expired entries.
fn memory_cache(config: &CacheConfig) -> Arc<dyn DocumentCache> {
    let cache = Arc::new(MemoryCache::new(config.ttl()).with_max_entries(config.max_entries));

    if config.ttl().is_some() {
        cache.spawn_sweeper(CACHE_CLEANUP_INTERVAL);
    }

    cache
}

/// Falls back to the in-process cache when Redis is disabled or its pool
/// cannot be built.
fn build_cache(config: &CacheConfig) -> Arc<dyn DocumentCache> {
    if !config.enabled {
        tracing::info!("Cache: in-process, up to {} entries", config.max_entries);
        return memory_cache(config);
    }

    match RedisCache::connect(config) {
        Ok(cache) => {
            tracing::info!("Cache: redis at {}:{}", config.host, config.port);
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!("Redis cache unavailable ({}), using in-process cache", e);
            memory_cache(config)
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(std::env::var("DOCSHELF_CONFIG").ok().map(PathBuf::from))?;

    tracing::info!("Database: {}", config.database_path.display());
    let pool = init_db(&config.database_path, &config.database).await?;

    let cache = build_cache(&config.cache);
    if !cache.is_available().await {
        tracing::warn!("Cache backend '{}' is not reachable yet", cache.name());
    }

    let state = AppState::new(pool, cache, &config);

    let identity = state.identity.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = identity.cleanup_expired_tokens();
            if removed > 0 {
                tracing::debug!("Removed {} expired token(s)", removed);
            }
        }
    });

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docshelf=info,docshelf_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

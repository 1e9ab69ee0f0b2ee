use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Path to the SQLite database
    pub database_path: PathBuf,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    /// Lifetime of issued `x-auth-token` values
    pub token_expiry_minutes: u64,
    /// Title of the role whose members are administrators
    pub admin_role: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection
    pub acquire_timeout_ms: u64,
}

/// Document cache settings.
///
/// With `enabled: false` an in-process cache is used instead of Redis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub db: u32,
    pub pool_size: usize,
    /// Upper bound on every cache call
    pub timeout_ms: u64,
    /// Entry lifetime; `null` keeps entries until invalidated
    pub ttl_secs: Option<u64>,
    /// Upper bound on entries held by the in-process cache
    pub max_entries: usize,
    pub key_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docshelf");
        Self {
            port: 8080,
            database_path: data_dir.join("docshelf.db"),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            token_expiry_minutes: 60 * 24,
            admin_role: "admin".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            pool_size: 16,
            timeout_ms: 250,
            ttl_secs: Some(300),
            max_entries: 10_000,
            key_prefix: "document:".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(port) = env_parse("DOCSHELF_PORT")? {
            self.port = port;
        }
        if let Ok(db_path) = std::env::var("DOCSHELF_DATABASE_PATH") {
            self.database_path = PathBuf::from(db_path);
        }
        if let Some(enabled) = env_parse("DOCSHELF_CACHE_ENABLED")? {
            self.cache.enabled = enabled;
        }
        if let Ok(host) = std::env::var("DOCSHELF_CACHE_HOST") {
            self.cache.host = host;
        }
        if let Some(port) = env_parse("DOCSHELF_CACHE_PORT")? {
            self.cache.port = port;
        }
        if let Some(ttl) = env_parse("DOCSHELF_CACHE_TTL_SECS")? {
            self.cache.ttl_secs = Some(ttl);
        }
        if let Some(max_entries) = env_parse("DOCSHELF_CACHE_MAX_ENTRIES")? {
            self.cache.max_entries = max_entries;
        }
        if let Ok(admin_role) = std::env::var("DOCSHELF_ADMIN_ROLE") {
            self.admin_role = admin_role;
        }
        Ok(())
    }

    /// Default config file path: ~/.config/docshelf/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docshelf")
            .join("config.yaml")
    }
}

fn env_parse<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv(name, raw)),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidEnv(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
            ConfigError::InvalidEnv(name, value) => {
                write!(f, "Invalid value '{}' for {}", value, name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

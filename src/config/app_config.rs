use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::cache::{InMemoryCacheConfig, RedisCacheConfig};
use crate::infrastructure::coffee::PostgresConfig;
use crate::infrastructure::services::CoffeeCacheConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub storage: StorageSettings,
    pub money: MoneySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where cached coffees and their index live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    #[serde(alias = "memory")]
    InMemory,
    Redis,
}

/// Where the source of truth lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    #[serde(alias = "memory")]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    pub namespace: String,
    pub ttl_secs: u64,
    pub max_capacity: u64,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Create `t_coffee` and insert the default menu on startup
    pub seed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MoneySettings {
    pub currency: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: None,
            key_prefix: None,
            namespace: "coffee".to_string(),
            ttl_secs: 60,
            max_capacity: 10_000,
            connection_timeout_secs: 5,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: 10,
            seed: true,
        }
    }
}

impl Default for MoneySettings {
    fn default() -> Self {
        Self {
            currency: "TWD".to_string(),
        }
    }
}

impl CacheSettings {
    pub fn in_memory_config(&self) -> InMemoryCacheConfig {
        InMemoryCacheConfig::default().with_max_capacity(self.max_capacity)
    }

    /// Redis connection settings; `redis_url` is required
    pub fn redis_config(&self) -> Result<RedisCacheConfig, DomainError> {
        let url = self.redis_url.clone().ok_or_else(|| {
            DomainError::configuration("cache.redis_url is required for the redis backend")
        })?;

        let mut config = RedisCacheConfig::new(url)
            .with_connection_timeout(Duration::from_secs(self.connection_timeout_secs));

        if let Some(prefix) = &self.key_prefix {
            config = config.with_key_prefix(prefix.clone());
        }

        Ok(config)
    }

    /// Namespace and ttl shared by cached coffees and their index entries
    pub fn to_coffee_cache_config(&self) -> CoffeeCacheConfig {
        CoffeeCacheConfig::default()
            .with_namespace(self.namespace.clone())
            .with_ttl(Duration::from_secs(self.ttl_secs))
    }
}

impl StorageSettings {
    pub fn to_postgres_config(&self) -> Option<PostgresConfig> {
        self.database_url
            .as_ref()
            .map(|url| PostgresConfig::new(url.clone()).with_max_connections(self.max_connections))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

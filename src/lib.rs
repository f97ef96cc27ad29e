//! bucks-cache
//!
//! Read-through cache-aside lookups of coffees by name:
//! - Primary store in memory or PostgreSQL
//! - Cache in process (moka) or Redis
//! - Secondary index with shared lifetimes and passive expiration

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{CacheBackend, CacheSettings, StorageBackend};
use crate::domain::{Cache, CoffeeRepository, Currency, DecimalMinorCodec, MoneyCodec};
use crate::infrastructure::{
    cache::{InMemoryCache, RedisCache},
    coffee::{InMemoryCoffeeRepository, PostgresCoffeeRepository},
    services::CoffeeService,
};

/// Build the coffee service from configuration
///
/// Components are created in dependency order: codec, cache, primary store,
/// then the service with its index.
pub async fn create_coffee_service(config: &AppConfig) -> anyhow::Result<CoffeeService> {
    let currency = Currency::of(&config.money.currency)?;
    let codec: Arc<dyn MoneyCodec> = Arc::new(DecimalMinorCodec::new(currency.clone()));

    let cache = create_cache(&config.cache).await?;

    let repository = create_repository(config, &currency).await?;

    let service = CoffeeService::new(
        repository,
        cache,
        codec,
        config.cache.to_coffee_cache_config(),
    )?;

    info!(
        namespace = %service.config().namespace,
        ttl_secs = service.config().ttl.as_secs(),
        "Coffee service ready"
    );

    Ok(service)
}

async fn create_cache(settings: &CacheSettings) -> anyhow::Result<Arc<dyn Cache>> {
    match settings.backend {
        CacheBackend::InMemory => {
            info!(max_capacity = settings.max_capacity, "Cache backend: in_memory");
            Ok(Arc::new(InMemoryCache::with_config(settings.in_memory_config())))
        }
        CacheBackend::Redis => {
            info!("Cache backend: redis");
            let cache = RedisCache::new(settings.redis_config()?).await?;
            Ok(Arc::new(cache))
        }
    }
}

async fn create_repository(
    config: &AppConfig,
    currency: &Currency,
) -> anyhow::Result<Arc<dyn CoffeeRepository>> {
    if config.storage.backend == StorageBackend::InMemory {
        info!("Storage backend: in_memory");
        return Ok(Arc::new(InMemoryCoffeeRepository::seeded(currency)));
    }

    info!("Storage backend: postgres");

    let mut storage = config.storage.clone();
    if storage.database_url.is_none() {
        storage.database_url = std::env::var("DATABASE_URL").ok();
    }

    let postgres = storage
        .to_postgres_config()
        .context("storage.database_url or DATABASE_URL is required for the postgres backend")?;

    let repository = PostgresCoffeeRepository::connect(&postgres, currency.clone()).await?;

    if storage.seed {
        repository.ensure_schema().await?;
        repository.seed_defaults().await?;
    }

    Ok(Arc::new(repository))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_builds_in_memory_service() {
        let service = create_coffee_service(&AppConfig::default()).await.unwrap();

        let first = service.find_by_name("mocha").await.unwrap().unwrap();
        let second = service.find_by_name("mocha").await.unwrap().unwrap();

        assert!(first.has_bookkeeping());
        assert!(!second.has_bookkeeping());
        assert_eq!(second.price().unwrap().to_string(), "TWD 150.00");
    }

    #[tokio::test]
    async fn test_unknown_currency_fails() {
        let mut config = AppConfig::default();
        config.money.currency = "XXX".to_string();

        assert!(create_coffee_service(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_rejected_before_any_lookup() {
        let mut config = AppConfig::default();
        config.cache.ttl_secs = u64::MAX;

        let err = create_coffee_service(&config).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<domain::DomainError>(),
            Some(domain::DomainError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_redis_backend_without_url_fails() {
        let mut config = AppConfig::default();
        config.cache.backend = CacheBackend::Redis;

        let err = create_coffee_service(&config).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<domain::DomainError>(),
            Some(domain::DomainError::Configuration { .. })
        ));
    }
}

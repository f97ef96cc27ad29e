//! Cache-aside lookup of coffees by name

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::domain::DomainError;
use crate::domain::cache::{Cache, Keyspace};
use crate::domain::coffee::{CachedCoffee, Coffee, CoffeeId, CoffeeRepository};
use crate::domain::money::MoneyCodec;
use crate::infrastructure::index::KeyIndex;

/// Attribute under which coffees are indexed
pub const NAME_ATTRIBUTE: &str = "name";

/// Longest lifetime accepted for a cached coffee
pub const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const HITS_TOTAL: &str = "coffee_cache_hits_total";
const MISSES_TOTAL: &str = "coffee_cache_misses_total";
const ORPHANS_TOTAL: &str = "coffee_cache_orphans_total";
const POPULATIONS_TOTAL: &str = "coffee_cache_populations_total";

/// Configuration for coffee caching
#[derive(Debug, Clone)]
pub struct CoffeeCacheConfig {
    /// Namespace for every key written by the service
    pub namespace: String,
    /// Lifetime shared by a cached coffee and its index entries
    pub ttl: Duration,
}

impl Default for CoffeeCacheConfig {
    fn default() -> Self {
        Self {
            namespace: "coffee".to_string(),
            ttl: Duration::from_secs(60),
        }
    }
}

impl CoffeeCacheConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Read-through coffee lookups backed by the primary store
///
/// Hits return the cached projection (`id`, `name`, `price`). Misses go to
/// the repository, then write the projection and register its index entry
/// under the same ttl. Concurrent misses may both populate; the last write
/// wins and the index stays consistent.
pub struct CoffeeService {
    repository: Arc<dyn CoffeeRepository>,
    cache: Arc<dyn Cache>,
    index: KeyIndex,
    codec: Arc<dyn MoneyCodec>,
    config: CoffeeCacheConfig,
}

impl fmt::Debug for CoffeeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoffeeService")
            .field("cache", &self.cache)
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish()
    }
}

impl CoffeeService {
    /// Creates the service; the index shares the data cache
    pub fn new(
        repository: Arc<dyn CoffeeRepository>,
        cache: Arc<dyn Cache>,
        codec: Arc<dyn MoneyCodec>,
        config: CoffeeCacheConfig,
    ) -> Result<Self, DomainError> {
        if config.ttl.is_zero() {
            return Err(DomainError::configuration("Coffee cache ttl must be positive"));
        }

        if config.ttl > MAX_TTL {
            return Err(DomainError::configuration(format!(
                "Coffee cache ttl of {}s exceeds the maximum of {}s",
                config.ttl.as_secs(),
                MAX_TTL.as_secs()
            )));
        }

        let keys = Keyspace::new(config.namespace.clone())?;
        let index = KeyIndex::new(cache.clone(), keys);

        Ok(Self {
            repository,
            cache,
            index,
            codec,
            config,
        })
    }

    pub fn index(&self) -> &KeyIndex {
        &self.index
    }

    pub fn config(&self) -> &CoffeeCacheConfig {
        &self.config
    }

    fn keys(&self) -> &Keyspace {
        self.index.keyspace()
    }

    /// Looks a coffee up by name, cache first
    ///
    /// The first primary-sourced call returns the full entity; later calls
    /// return the projection until it expires. Absence is never cached.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Coffee>, DomainError> {
        if let Some(coffee) = self.find_cached(name).await? {
            counter!(HITS_TOTAL).increment(1);
            debug!(name, id = %coffee.id(), "Coffee served from cache");
            return Ok(Some(coffee));
        }

        counter!(MISSES_TOTAL).increment(1);

        let Some(coffee) = self.repository.find_by_name(name).await? else {
            debug!(name, "Coffee not found in primary store");
            return Ok(None);
        };

        self.populate(&coffee).await?;

        Ok(Some(coffee))
    }

    /// Drops the cached coffee and its index entries
    ///
    /// Returns true when anything was removed.
    pub async fn invalidate(&self, id: CoffeeId) -> Result<bool, DomainError> {
        let deregistered = self.index.deregister(id.value()).await?;
        let deleted = self.cache.delete(&self.keys().primary_key(id.value())).await?;

        info!(id = %id, deregistered, deleted, "Invalidated cached coffee");

        Ok(deregistered || deleted)
    }

    async fn find_cached(&self, name: &str) -> Result<Option<Coffee>, DomainError> {
        let ids = self.index.resolve_by_secondary(NAME_ATTRIBUTE, name).await?;

        let Some(&id) = ids.first() else {
            return Ok(None);
        };

        if ids.len() > 1 {
            warn!(name, ids = ?ids, chosen = id, "Several cached coffees share one name");
        }

        let Some(bytes) = self.cache.get(&self.keys().primary_key(id)).await? else {
            counter!(ORPHANS_TOTAL).increment(1);
            info!(name, id, "Index entry has no cached data, reading primary store");
            return Ok(None);
        };

        let cached = CachedCoffee::decode(&bytes, self.codec.as_ref())?;

        if cached.name != name {
            counter!(ORPHANS_TOTAL).increment(1);
            info!(name, id, cached_name = %cached.name, "Cached coffee was renamed, reading primary store");
            return Ok(None);
        }

        Ok(Some(cached.into_coffee()))
    }

    async fn populate(&self, coffee: &Coffee) -> Result<(), DomainError> {
        let id = coffee.id().value();
        let ttl = self.config.ttl;
        let bytes = CachedCoffee::from(coffee).encode(self.codec.as_ref())?;

        // Data before index: a reader never resolves an id whose data was
        // not yet written by this population.
        self.cache
            .put_with_ttl(&self.keys().primary_key(id), &bytes, ttl)
            .await?;

        let attributes =
            BTreeMap::from([(NAME_ATTRIBUTE.to_string(), coffee.name().to_string())]);
        self.index.register(id, &attributes, ttl).await?;

        counter!(POPULATIONS_TOTAL).increment(1);
        info!(name = coffee.name(), id, ttl_secs = ttl.as_secs(), "Cached coffee from primary store");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::domain::cache::{KeyTtl, MockCache};
    use crate::domain::coffee::MockCoffeeRepository;
    use crate::domain::money::{Currency, DecimalMinorCodec, Money};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::coffee::InMemoryCoffeeRepository;

    fn twd() -> Currency {
        Currency::of("TWD").unwrap()
    }

    fn codec() -> Arc<dyn MoneyCodec> {
        Arc::new(DecimalMinorCodec::new(twd()))
    }

    fn mocha() -> Coffee {
        let now = Utc::now();
        Coffee::new(
            CoffeeId::new(4),
            "mocha",
            Some(Money::of_minor(twd(), 15_000)),
        )
        .with_timestamps(now, now)
    }

    fn repository_returning(coffee: Coffee, times: usize) -> Arc<dyn CoffeeRepository> {
        let mut repo = MockCoffeeRepository::new();
        repo.expect_find_by_name()
            .withf(|name| name == "mocha")
            .times(times)
            .returning(move |_| Ok(Some(coffee.clone())));
        Arc::new(repo)
    }

    fn service(repository: Arc<dyn CoffeeRepository>, cache: Arc<dyn Cache>, ttl: Duration) -> CoffeeService {
        CoffeeService::new(
            repository,
            cache,
            codec(),
            CoffeeCacheConfig::default().with_ttl(ttl),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let service = service(
            repository_returning(mocha(), 1),
            Arc::new(InMemoryCache::new()),
            Duration::from_secs(60),
        );

        let first = service.find_by_name("mocha").await.unwrap().unwrap();
        let second = service.find_by_name("mocha").await.unwrap().unwrap();

        assert!(first.has_bookkeeping());
        assert!(!second.has_bookkeeping());
        assert_eq!(second.id(), first.id());
        assert_eq!(second.name(), first.name());
        assert_eq!(second.price(), first.price());
        assert_eq!(second.to_string(), "Coffee(id=4, name=mocha, price=TWD 150.00)");
    }

    async fn cache_mocha_under(service: &CoffeeService, cache: &Arc<dyn Cache>, id: i64, with_data: bool) {
        let ttl = Duration::from_secs(60);

        if with_data {
            let coffee = Coffee::new(
                CoffeeId::new(id),
                "mocha",
                Some(Money::of_minor(twd(), 15_000)),
            );
            let bytes = CachedCoffee::from(&coffee).encode(codec().as_ref()).unwrap();
            cache
                .put_with_ttl(&format!("coffee:{}", id), &bytes, ttl)
                .await
                .unwrap();
        }

        let attributes = BTreeMap::from([("name".to_string(), "mocha".to_string())]);
        service.index().register(id, &attributes, ttl).await.unwrap();
    }

    #[tokio::test]
    async fn test_several_ids_for_one_name_serves_lowest() {
        let mut repo = MockCoffeeRepository::new();
        repo.expect_find_by_name().times(0);

        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = service(Arc::new(repo), cache.clone(), Duration::from_secs(60));

        cache_mocha_under(&service, &cache, 7, true).await;
        cache_mocha_under(&service, &cache, 4, true).await;

        let coffee = service.find_by_name("mocha").await.unwrap().unwrap();

        assert_eq!(coffee.id(), CoffeeId::new(4));
        assert!(!coffee.has_bookkeeping());
    }

    #[tokio::test]
    async fn test_several_ids_with_lowest_missing_data_reads_primary_store() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = service(
            repository_returning(mocha(), 1),
            cache.clone(),
            Duration::from_secs(60),
        );

        cache_mocha_under(&service, &cache, 4, false).await;
        cache_mocha_under(&service, &cache, 7, true).await;

        let coffee = service.find_by_name("mocha").await.unwrap().unwrap();

        assert_eq!(coffee.id(), CoffeeId::new(4));
        assert!(coffee.has_bookkeeping());
        assert!(cache.get("coffee:4").await.unwrap().is_some());
        assert_eq!(
            service.index().resolve_by_secondary("name", "mocha").await.unwrap(),
            BTreeSet::from([4, 7])
        );
    }

    #[tokio::test]
    async fn test_population_writes_expected_keys() {
        let cache = Arc::new(MockCache::new());
        let service = service(
            repository_returning(mocha(), 1),
            cache.clone(),
            Duration::from_secs(60),
        );

        service.find_by_name("mocha").await.unwrap();

        assert_eq!(
            cache.keys(),
            vec!["coffee", "coffee:4", "coffee:4:idx", "coffee:name:mocha"]
        );
        for key in ["coffee:4", "coffee:4:idx", "coffee:name:mocha"] {
            assert_eq!(cache.recorded_ttl(key), Some(Duration::from_secs(60)), "key {}", key);
        }
        assert!(cache.set_contains("coffee:name:mocha", "4").await.unwrap());

        let stored = cache.get("coffee:4").await.unwrap().unwrap();
        let projection: serde_json::Value = serde_json::from_slice(&stored).unwrap();
        assert_eq!(
            projection,
            serde_json::json!({"id": 4, "name": "mocha", "price": "15000"})
        );
    }

    #[tokio::test]
    async fn test_data_and_index_expire_together() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = service(
            repository_returning(mocha(), 2),
            cache.clone(),
            Duration::from_millis(50),
        );

        service.find_by_name("mocha").await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get("coffee:4").await.unwrap().is_none());
        assert!(
            service
                .index()
                .resolve_by_secondary("name", "mocha")
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(cache.ttl("coffee:4:idx").await.unwrap(), KeyTtl::Missing);

        let refreshed = service.find_by_name("mocha").await.unwrap().unwrap();
        assert!(refreshed.has_bookkeeping());
    }

    #[tokio::test]
    async fn test_missing_data_falls_through_and_repopulates() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = service(
            repository_returning(mocha(), 2),
            cache.clone(),
            Duration::from_secs(60),
        );

        service.find_by_name("mocha").await.unwrap();
        cache.delete("coffee:4").await.unwrap();

        let healed = service.find_by_name("mocha").await.unwrap().unwrap();
        assert!(healed.has_bookkeeping());
        assert!(cache.get("coffee:4").await.unwrap().is_some());
        assert_eq!(
            service.index().resolve_by_secondary("name", "mocha").await.unwrap(),
            BTreeSet::from([4])
        );

        let cached = service.find_by_name("mocha").await.unwrap().unwrap();
        assert!(!cached.has_bookkeeping());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_leave_one_index_entry() {
        let repository = Arc::new(InMemoryCoffeeRepository::seeded(&twd()));
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = Arc::new(service(repository, cache, Duration::from_secs(60)));

        let lookups = (0..16).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.find_by_name("mocha").await })
        });

        for result in futures::future::join_all(lookups).await {
            let coffee = result.unwrap().unwrap().unwrap();
            assert_eq!(coffee.id(), CoffeeId::new(4));
        }

        let index = service.index();
        assert_eq!(
            index.resolve_by_secondary("name", "mocha").await.unwrap(),
            BTreeSet::from([4])
        );

        let registered = index.registered_keys(4).await.unwrap();
        let index_keys: Vec<_> = registered
            .iter()
            .filter(|key| key.as_str() != index.keyspace().id_set_key())
            .collect();
        assert_eq!(index_keys, vec!["coffee:name:mocha"]);
    }

    #[tokio::test]
    async fn test_absence_is_not_cached() {
        let mut repo = MockCoffeeRepository::new();
        repo.expect_find_by_name().times(2).returning(|_| Ok(None));

        let cache = Arc::new(MockCache::new());
        let service = service(Arc::new(repo), cache.clone(), Duration::from_secs(60));

        assert!(service.find_by_name("flat white").await.unwrap().is_none());
        assert!(service.find_by_name("flat white").await.unwrap().is_none());
        assert!(cache.keys().is_empty());
    }

    #[tokio::test]
    async fn test_cache_failure_propagates() {
        let mut repo = MockCoffeeRepository::new();
        repo.expect_find_by_name().times(0);

        let service = service(
            Arc::new(repo),
            Arc::new(MockCache::new().with_error()),
            Duration::from_secs(60),
        );

        let result = service.find_by_name("mocha").await;
        assert!(matches!(result, Err(DomainError::BackendUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_cache_failure_during_population_propagates() {
        let cache = Arc::new(MockCache::new());
        let mut repo = MockCoffeeRepository::new();
        let failing = cache.clone();
        repo.expect_find_by_name().times(1).returning(move |_| {
            failing.set_failing(true);
            Ok(Some(mocha()))
        });

        let service = service(Arc::new(repo), cache, Duration::from_secs(60));

        let result = service.find_by_name("mocha").await;
        assert!(matches!(result, Err(DomainError::BackendUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let mut repo = MockCoffeeRepository::new();
        repo.expect_find_by_name()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let service = service(
            Arc::new(repo),
            Arc::new(InMemoryCache::new()),
            Duration::from_secs(60),
        );

        let err = service.find_by_name("mocha").await.unwrap_err();
        assert!(err.is_backend_unavailable());
    }

    #[tokio::test]
    async fn test_corrupt_cached_value_is_an_error() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = service(
            repository_returning(mocha(), 1),
            cache.clone(),
            Duration::from_secs(60),
        );

        service.find_by_name("mocha").await.unwrap();
        cache
            .put_with_ttl(
                "coffee:4",
                br#"{"id":4,"name":"mocha","price":"abc"}"#,
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let result = service.find_by_name("mocha").await;
        assert!(matches!(result, Err(DomainError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unpriced_coffee_round_trips() {
        let water = Coffee::new(CoffeeId::new(9), "water", None);
        let repository = Arc::new(InMemoryCoffeeRepository::with_coffees(vec![water]));
        let service = service(
            repository,
            Arc::new(InMemoryCache::new()),
            Duration::from_secs(60),
        );

        service.find_by_name("water").await.unwrap();
        let cached = service.find_by_name("water").await.unwrap().unwrap();

        assert_eq!(cached.id(), CoffeeId::new(9));
        assert!(cached.price().is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let service = service(
            repository_returning(mocha(), 2),
            cache.clone(),
            Duration::from_secs(60),
        );

        service.find_by_name("mocha").await.unwrap();
        assert!(service.invalidate(CoffeeId::new(4)).await.unwrap());
        assert!(!service.invalidate(CoffeeId::new(4)).await.unwrap());

        assert!(!cache.exists("coffee:4").await.unwrap());
        assert!(!cache.exists("coffee:name:mocha").await.unwrap());

        let reloaded = service.find_by_name("mocha").await.unwrap().unwrap();
        assert!(reloaded.has_bookkeeping());
    }

    #[test]
    fn test_rejects_out_of_range_ttl_and_bad_namespace() {
        let repo: Arc<dyn CoffeeRepository> = Arc::new(InMemoryCoffeeRepository::new());
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());

        let zero = CoffeeService::new(
            repo.clone(),
            cache.clone(),
            codec(),
            CoffeeCacheConfig::default().with_ttl(Duration::ZERO),
        );
        assert!(matches!(zero, Err(DomainError::Configuration { .. })));

        let huge = CoffeeService::new(
            repo.clone(),
            cache.clone(),
            codec(),
            CoffeeCacheConfig::default().with_ttl(Duration::from_secs(u64::MAX)),
        );
        assert!(matches!(huge, Err(DomainError::Configuration { .. })));

        let longest = CoffeeService::new(
            repo.clone(),
            cache.clone(),
            codec(),
            CoffeeCacheConfig::default().with_ttl(MAX_TTL),
        );
        assert!(longest.is_ok());

        let bad = CoffeeService::new(
            repo,
            cache,
            codec(),
            CoffeeCacheConfig::default().with_namespace("coffee:v2"),
        );
        assert!(matches!(bad, Err(DomainError::Configuration { .. })));
    }
}

//! In-memory cache implementation using moka

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::Mutex;

use crate::domain::DomainError;
use crate::domain::cache::{Cache, KeyTtl};

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of keys
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl InMemoryCacheConfig {
    /// Sets the maximum number of keys
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

#[derive(Debug, Clone)]
enum StoredValue {
    Bytes(Vec<u8>),
    Set(BTreeSet<String>),
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    value: StoredValue,
    /// `None` for keys without an expiration
    expires_at: Option<Instant>,
}

/// Expiration instant for `ttl` from now; beyond the clock's range the key never expires
fn deadline(ttl: Duration) -> Option<Instant> {
    Instant::now().checked_add(ttl)
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Thread-safe in-memory cache implementation using moka
///
/// Expiration is checked on access; an expired key reads as missing. Writes
/// are serialized so read-modify-write on sets stays atomic per key.
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    write_lock: Mutex<()>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .build();

        Self {
            cache,
            write_lock: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    /// Returns the entry for a key unless it has expired
    ///
    /// Readers never remove entries; only writers holding the lock do.
    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        self.cache.get(key).await.filter(|entry| !entry.is_expired())
    }

    fn wrong_type(key: &str, expected: &str) -> DomainError {
        DomainError::internal(format!("Key '{}' does not hold a {}", key, expected))
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        match self.live_entry(key).await {
            Some(CacheEntry {
                value: StoredValue::Bytes(bytes),
                ..
            }) => Ok(Some(bytes)),
            Some(_) => Err(Self::wrong_type(key, "value")),
            None => Ok(None),
        }
    }

    async fn put_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let entry = CacheEntry {
            value: StoredValue::Bytes(value.to_vec()),
            expires_at: deadline(ttl),
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let _guard = self.write_lock.lock().await;
        let existed = self.live_entry(key).await.is_some();
        self.cache.remove(key).await;
        Ok(existed)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        let _guard = self.write_lock.lock().await;

        let mut entry = self.live_entry(key).await.unwrap_or(CacheEntry {
            value: StoredValue::Set(BTreeSet::new()),
            expires_at: None,
        });

        let added = match &mut entry.value {
            StoredValue::Set(members) => members.insert(member.to_string()),
            StoredValue::Bytes(_) => return Err(Self::wrong_type(key, "set")),
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(added)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        let _guard = self.write_lock.lock().await;

        let Some(mut entry) = self.live_entry(key).await else {
            return Ok(false);
        };

        let (removed, now_empty) = match &mut entry.value {
            StoredValue::Set(members) => (members.remove(member), members.is_empty()),
            StoredValue::Bytes(_) => return Err(Self::wrong_type(key, "set")),
        };

        if now_empty {
            self.cache.remove(key).await;
        } else if removed {
            self.cache.insert(key.to_string(), entry).await;
        }

        Ok(removed)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, DomainError> {
        match self.live_entry(key).await {
            Some(CacheEntry {
                value: StoredValue::Set(members),
                ..
            }) => Ok(members.into_iter().collect()),
            Some(_) => Err(Self::wrong_type(key, "set")),
            None => Ok(Vec::new()),
        }
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        match self.live_entry(key).await {
            Some(CacheEntry {
                value: StoredValue::Set(members),
                ..
            }) => Ok(members.contains(member)),
            Some(_) => Err(Self::wrong_type(key, "set")),
            None => Ok(false),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let _guard = self.write_lock.lock().await;

        match self.live_entry(key).await {
            Some(mut entry) => {
                entry.expires_at = deadline(ttl);
                self.cache.insert(key.to_string(), entry).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, DomainError> {
        Ok(match self.live_entry(key).await {
            Some(CacheEntry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expiring(at.saturating_duration_since(Instant::now())),
            Some(_) => KeyTtl::Persistent,
            None => KeyTtl::Missing,
        })
    }
}

//! Secondary index over cached entries
//!
//! For an id `I` registered with attributes `{a: v, ..}` the index keeps:
//!
//! - `I` in the id-set `{ns}` and in every membership set `{ns}:{a}:{v}`
//! - the reverse registry `{ns}:{I}:idx` naming each of those set keys
//!
//! A membership only counts while the registry of its id still names the
//! set. The registry carries exactly the entry's ttl, so when it lapses every
//! membership of the id goes stale at once, even inside shared sets that are
//! kept alive by other ids. Reads skip stale members; nothing sweeps.
//!
//! The registry expires from the moment it is created, so a registration
//! interrupted part way never leaves a registry without a lifetime.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::DomainError;
use crate::domain::cache::{Cache, Keyspace};

/// Index of lookup keys derived from an entry's attributes
#[derive(Debug, Clone)]
pub struct KeyIndex {
    cache: Arc<dyn Cache>,
    keys: Keyspace,
}

impl KeyIndex {
    pub fn new(cache: Arc<dyn Cache>, keys: Keyspace) -> Self {
        Self { cache, keys }
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keys
    }

    /// Registers `id` under each attribute value, all sharing `ttl`
    ///
    /// Re-registering refreshes every lifetime. Index keys from an earlier
    /// registration that are not in `attributes` are released.
    pub async fn register(
        &self,
        id: i64,
        attributes: &BTreeMap<String, String>,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let member = id.to_string();
        let registry_key = self.keys.registry_key(id);
        let id_set_key = self.keys.id_set_key();

        let mut set_keys = attributes
            .iter()
            .map(|(attribute, value)| self.keys.index_key(attribute, value))
            .collect::<Result<BTreeSet<_>, _>>()?;
        set_keys.insert(id_set_key);

        for previous in self.cache.set_members(&registry_key).await? {
            if !set_keys.contains(&previous) {
                debug!(id, key = %previous, "Releasing index key no longer carried");
                self.cache.set_remove(&previous, &member).await?;
                self.cache.set_remove(&registry_key, &previous).await?;
            }
        }

        // The registry is written before any membership so a membership is
        // never visible without the registry entry that makes it live. It
        // gets its ttl right after the first add; later adds keep it.
        let mut registry_members = set_keys.iter();
        if let Some(first) = registry_members.next() {
            self.cache.set_add(&registry_key, first).await?;
            self.cache.expire(&registry_key, ttl).await?;
        }
        for set_key in registry_members {
            self.cache.set_add(&registry_key, set_key).await?;
        }

        for set_key in &set_keys {
            self.cache.set_add(set_key, &member).await?;
            self.cache.extend_ttl(set_key, ttl).await?;
        }

        debug!(id, keys = set_keys.len(), ttl_secs = ttl.as_secs(), "Registered index entry");
        Ok(())
    }

    /// Returns the live ids carrying `value` for `attribute`
    pub async fn resolve_by_secondary(
        &self,
        attribute: &str,
        value: &str,
    ) -> Result<BTreeSet<i64>, DomainError> {
        let index_key = self.keys.index_key(attribute, value)?;
        self.live_members(&index_key).await
    }

    /// Returns every live id in the namespace
    pub async fn live_ids(&self) -> Result<BTreeSet<i64>, DomainError> {
        self.live_members(&self.keys.id_set_key()).await
    }

    /// Set keys currently named by the registry of `id`
    pub async fn registered_keys(&self, id: i64) -> Result<BTreeSet<String>, DomainError> {
        let members = self.cache.set_members(&self.keys.registry_key(id)).await?;
        Ok(members.into_iter().collect())
    }

    /// Removes `id` from every set its registry names, then the registry
    ///
    /// Returns false when the registry was already gone. The id is dropped
    /// from the id-set either way.
    pub async fn deregister(&self, id: i64) -> Result<bool, DomainError> {
        let member = id.to_string();
        let registry_key = self.keys.registry_key(id);
        let id_set_key = self.keys.id_set_key();

        let registered = self.cache.set_members(&registry_key).await?;

        for set_key in &registered {
            self.cache.set_remove(set_key, &member).await?;
        }

        if !registered.contains(&id_set_key) {
            self.cache.set_remove(&id_set_key, &member).await?;
        }

        let existed = self.cache.delete(&registry_key).await?;
        debug!(id, existed, "Deregistered index entry");

        Ok(existed)
    }

    async fn live_members(&self, set_key: &str) -> Result<BTreeSet<i64>, DomainError> {
        let mut live = BTreeSet::new();

        for member in self.cache.set_members(set_key).await? {
            let Ok(id) = member.parse::<i64>() else {
                warn!(key = set_key, member = %member, "Ignoring non-numeric index member");
                continue;
            };

            if self
                .cache
                .set_contains(&self.keys.registry_key(id), set_key)
                .await?
            {
                live.insert(id);
            }
        }

        Ok(live)
    }
}

//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Remaining lifetime of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist (or has expired)
    Missing,
    /// The key exists without an expiration
    Persistent,
    /// The key expires after the given duration
    Expiring(Duration),
}

/// Byte-oriented key-value backend with per-key expiration
///
/// Each call is atomic for its single key and nothing more. Absence is
/// `Ok(None)`/`Ok(false)`; an `Err` always means the backend failed and must
/// not be mistaken for a miss.
///
/// Set keys follow Redis semantics: adding to a missing set creates it
/// without an expiration, and removing the last member deletes the key.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a value
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Stores a value that expires after `ttl`, replacing any previous value
    async fn put_with_ttl(&self, key: &str, value: &[u8], ttl: Duration)
    -> Result<(), DomainError>;

    /// Deletes a key of any kind, returns true if it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Checks if a key of any kind exists
    async fn exists(&self, key: &str) -> Result<bool, DomainError>;

    /// Adds a member to a set, returns true if it was not present
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, DomainError>;

    /// Removes a member from a set, returns true if it was present
    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, DomainError>;

    /// Lists the members of a set; a missing set is empty
    async fn set_members(&self, key: &str) -> Result<Vec<String>, DomainError>;

    /// Checks set membership
    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        Ok(self
            .set_members(key)
            .await?
            .iter()
            .any(|existing| existing == member))
    }

    /// Sets the expiration of an existing key, returns false if it is missing
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError>;

    /// Gets the remaining lifetime of a key
    async fn ttl(&self, key: &str) -> Result<KeyTtl, DomainError>;

    /// Makes an existing key live for at least `ttl`, never shortening it
    async fn extend_ttl(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        match self.ttl(key).await? {
            KeyTtl::Missing => Ok(false),
            KeyTtl::Expiring(remaining) if remaining >= ttl => Ok(true),
            KeyTtl::Persistent | KeyTtl::Expiring(_) => self.expire(key, ttl).await,
        }
    }
}

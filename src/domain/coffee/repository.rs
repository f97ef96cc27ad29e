//! Primary store trait for coffees

use async_trait::async_trait;

use super::Coffee;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Durable source of truth for coffees
///
/// Assumed strongly consistent. Absence is `Ok(None)`; an `Err` means the
/// store could not answer.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CoffeeRepository: Send + Sync {
    /// Finds a coffee by its natural key
    async fn find_by_name(&self, name: &str) -> Result<Option<Coffee>, DomainError>;
}

//! Coffee entity and identifier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;

/// Surrogate identifier assigned by the primary store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoffeeId(i64);

impl CoffeeId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for CoffeeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CoffeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CoffeeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A coffee as held by the primary store
///
/// Values sourced from the cache carry only `id`, `name` and `price`; their
/// bookkeeping timestamps are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coffee {
    id: CoffeeId,
    name: String,
    price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Coffee {
    /// Create a coffee without bookkeeping timestamps
    pub fn new(id: CoffeeId, name: impl Into<String>, price: Option<Money>) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            created_at: None,
            updated_at: None,
        }
    }

    /// Attach the store-managed timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    pub fn id(&self) -> CoffeeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Option<&Money> {
        self.price.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// True when the store bookkeeping fields are populated
    pub fn has_bookkeeping(&self) -> bool {
        self.created_at.is_some() || self.updated_at.is_some()
    }
}

impl std::fmt::Display for Coffee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.price {
            Some(price) => write!(f, "Coffee(id={}, name={}, price={})", self.id, self.name, price),
            None => write!(f, "Coffee(id={}, name={}, price=<none>)", self.id, self.name),
        }
    }
}

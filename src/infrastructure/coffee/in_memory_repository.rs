//! In-memory coffee repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::coffee::{Coffee, CoffeeId, CoffeeRepository};
use crate::domain::money::{Currency, Money};

/// The default menu as `(name, price in minor units)`, ids assigned by position
pub const DEFAULT_MENU: [(&str, i64); 5] = [
    ("espresso", 10_000),
    ("latte", 12_500),
    ("capuccino", 12_500),
    ("mocha", 15_000),
    ("macchiato", 15_000),
];

/// Builds the default menu with store timestamps set to now
pub fn default_coffees(currency: &Currency) -> Vec<Coffee> {
    let now = Utc::now();

    DEFAULT_MENU
        .iter()
        .zip(1_i64..)
        .map(|((name, minor), id)| {
            Coffee::new(
                CoffeeId::new(id),
                *name,
                Some(Money::of_minor(currency.clone(), *minor)),
            )
            .with_timestamps(now, now)
        })
        .collect()
}

/// In-memory implementation of CoffeeRepository keyed by name
#[derive(Debug, Default)]
pub struct InMemoryCoffeeRepository {
    coffees: Arc<RwLock<HashMap<String, Coffee>>>,
}

impl InMemoryCoffeeRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the given coffees
    pub fn with_coffees(coffees: Vec<Coffee>) -> Self {
        let coffees = coffees
            .into_iter()
            .map(|coffee| (coffee.name().to_string(), coffee))
            .collect();

        Self {
            coffees: Arc::new(RwLock::new(coffees)),
        }
    }

    /// Create a repository seeded with the default menu
    pub fn seeded(currency: &Currency) -> Self {
        Self::with_coffees(default_coffees(currency))
    }

    /// Insert or replace a coffee by name
    pub async fn upsert(&self, coffee: Coffee) {
        let mut coffees = self.coffees.write().await;
        coffees.insert(coffee.name().to_string(), coffee);
    }

    /// Remove a coffee by name
    pub async fn remove(&self, name: &str) -> bool {
        let mut coffees = self.coffees.write().await;
        coffees.remove(name).is_some()
    }

    pub async fn len(&self) -> usize {
        self.coffees.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.coffees.read().await.is_empty()
    }
}

#[async_trait]
impl CoffeeRepository for InMemoryCoffeeRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Coffee>, DomainError> {
        let coffees = self.coffees.read().await;
        Ok(coffees.get(name).cloned())
    }
}

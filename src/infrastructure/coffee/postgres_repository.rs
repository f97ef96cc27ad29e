//! PostgreSQL coffee repository implementation

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use super::in_memory_repository::DEFAULT_MENU;
use crate::domain::DomainError;
use crate::domain::coffee::{Coffee, CoffeeId, CoffeeRepository};
use crate::domain::money::{Currency, Money};

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Acquire timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/bucks".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Opens a connection pool
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

/// PostgreSQL implementation of CoffeeRepository
///
/// Prices live in a nullable `BIGINT` column of minor units in the
/// configured currency.
#[derive(Debug, Clone)]
pub struct PostgresCoffeeRepository {
    pool: PgPool,
    currency: Currency,
}

impl PostgresCoffeeRepository {
    pub fn new(pool: PgPool, currency: Currency) -> Self {
        Self { pool, currency }
    }

    /// Connects using the given configuration
    pub async fn connect(config: &PostgresConfig, currency: Currency) -> Result<Self, DomainError> {
        let pool = config.connect().await?;
        tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool, currency))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the coffee table if missing
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS t_coffee (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                price BIGINT,
                create_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                update_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create t_coffee: {}", e)))?;

        Ok(())
    }

    /// Inserts the default menu, leaving existing names untouched
    ///
    /// Returns the number of rows inserted.
    pub async fn seed_defaults(&self) -> Result<u64, DomainError> {
        let mut inserted = 0;

        for (name, price) in DEFAULT_MENU {
            let result = sqlx::query(
                r#"
                INSERT INTO t_coffee (name, price)
                VALUES ($1, $2)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(name)
            .bind(price)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to seed coffee '{}': {}", name, e)))?;

            inserted += result.rows_affected();
        }

        tracing::debug!(inserted, "Seeded default coffees");
        Ok(inserted)
    }
}

#[async_trait]
impl CoffeeRepository for PostgresCoffeeRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Coffee>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price, create_time, update_time
            FROM t_coffee
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find coffee by name: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_coffee(&row, &self.currency)?)),
            None => Ok(None),
        }
    }
}

fn row_to_coffee(row: &PgRow, currency: &Currency) -> Result<Coffee, DomainError> {
    let id: i64 = row.try_get("id").map_err(column_error)?;
    let name: String = row.try_get("name").map_err(column_error)?;
    let price: Option<i64> = row.try_get("price").map_err(column_error)?;
    let create_time: DateTime<Utc> = row.try_get("create_time").map_err(column_error)?;
    let update_time: DateTime<Utc> = row.try_get("update_time").map_err(column_error)?;

    Ok(coffee_from_columns(id, name, price, currency).with_timestamps(create_time, update_time))
}

fn coffee_from_columns(id: i64, name: String, price: Option<i64>, currency: &Currency) -> Coffee {
    let price = price.map(|minor| Money::of_minor(currency.clone(), minor));
    Coffee::new(CoffeeId::new(id), name, price)
}

fn column_error(e: sqlx::Error) -> DomainError {
    DomainError::storage(format!("Failed to read coffee row: {}", e))
}

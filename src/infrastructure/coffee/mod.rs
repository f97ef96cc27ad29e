//! Coffee primary store implementations

mod in_memory_repository;
mod postgres_repository;

pub use in_memory_repository::{DEFAULT_MENU, InMemoryCoffeeRepository, default_coffees};
pub use postgres_repository::{PostgresCoffeeRepository, PostgresConfig};

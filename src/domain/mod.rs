//! Domain layer - entities, capabilities and errors

pub mod cache;
pub mod coffee;
pub mod error;
pub mod money;

pub use cache::{Cache, KeyTtl, Keyspace};
pub use coffee::{CachedCoffee, Coffee, CoffeeId, CoffeeRepository};
pub use error::DomainError;
pub use money::{Currency, DecimalMinorCodec, DecodeError, Money, MoneyCodec};

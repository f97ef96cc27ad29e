//! Coffee domain

mod entity;
mod projection;
mod repository;

pub use entity::{Coffee, CoffeeId};
pub use projection::CachedCoffee;
pub use repository::CoffeeRepository;

#[cfg(test)]
pub use repository::MockCoffeeRepository;

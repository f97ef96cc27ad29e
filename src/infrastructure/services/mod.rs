//! Application services

mod coffee_service;

pub use coffee_service::{CoffeeCacheConfig, CoffeeService, MAX_TTL, NAME_ATTRIBUTE};

//! Cache infrastructure - Cache implementations

mod in_memory;
mod redis;

pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};

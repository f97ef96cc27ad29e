//! Cache domain - key layout and the backend abstraction

mod key;
mod repository;

pub use key::Keyspace;
pub use repository::{Cache, KeyTtl};

#[cfg(test)]
pub use repository::mock::MockCache;

//! Infrastructure layer - cache backends, primary stores and services

pub mod cache;
pub mod coffee;
pub mod index;
pub mod logging;
pub mod services;

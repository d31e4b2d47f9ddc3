//! Persistence layer for the settings engine.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The Postgres-backed override store
//! - The tag-addressable cache layer

pub mod cache;
pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use cache::{CacheBackend, CacheConfig, CacheError, CacheLayer, CacheStats};
pub use store::PgOverrideStore;

//! Domain layer for the settings engine.
//!
//! This crate contains:
//! - Domain models (Scope, ConfigEntry, FieldDefinition, EnumDefinition)
//! - The static setting registry
//! - Resolution, authorization and tag-derivation services
//! - The override store contract and its in-memory implementation
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::{DomainError, StoreError};

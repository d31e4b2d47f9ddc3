//! Shared utilities and common types for the settings engine.
//!
//! This crate provides functionality used across all other crates:
//! - Identifier validation (setting keys, field and enum names)
//! - Common validation helpers for definition payloads

pub mod validation;

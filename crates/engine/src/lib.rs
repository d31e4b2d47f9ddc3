//! Effective-configuration resolution for a multi-tenant school back office.
//!
//! [`SettingsEngine`] layers tenant overrides over global records and the
//! static default table for settings, custom field definitions and dynamic
//! enums, caching resolutions and invalidating them on write.

pub mod config;
pub mod context;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod logging;

pub use context::RequestContext;
pub use engine::SettingsEngine;
pub use error::EngineError;

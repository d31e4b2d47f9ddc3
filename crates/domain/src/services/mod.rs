//! Domain services for the settings engine.
//!
//! Resolution, query building, authorization and tag derivation are pure
//! functions over domain models; the override store is an async trait.

pub mod effective_query;
pub mod memory_store;
pub mod merge_resolver;
pub mod mutation_guard;
pub mod store;
pub mod tags;

pub use effective_query::{
    active_fields, effective_definition, effective_definitions, effective_enum_options,
    ScopedDefinition,
};
pub use memory_store::InMemoryOverrideStore;
pub use merge_resolver::{
    resolution_view, resolve_setting, Resolution, ResolvedSetting, SettingResolutionInput,
    SettingSource,
};
pub use mutation_guard::{authorize_delete, authorize_write, DenialReason, WriteDecision, WritePermit};
pub use store::{DeleteMode, OverrideStore, ReorderOutcome};
pub use tags::{cache_key, change_tags, read_tags, tags_for, CacheSubject, CacheTag, ENUM_CATALOG_TAG};

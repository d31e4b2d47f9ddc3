//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. A NULL `tenant_id` marks a
//! global row; conversion into domain models turns it into a `Scope`.

pub mod config_override;
pub mod enum_definition;
pub mod field_definition;

pub use config_override::ConfigOverrideEntity;
pub use enum_definition::EnumDefinitionEntity;
pub use field_definition::FieldDefinitionEntity;

//! Domain models for the settings engine.

pub mod actor;
pub mod change_event;
pub mod config_entry;
pub mod enum_definition;
pub mod field_definition;
pub mod registry;
pub mod scope;
pub mod target_type;

pub use actor::{Actor, Capability};
pub use change_event::{ChangeEvent, EntityKind};
pub use config_entry::{settings_map, Committed, ConfigEntry, SettingsMap};
pub use enum_definition::{EnumDefinition, EnumOption, NewEnumDefinition};
pub use field_definition::{FieldDefinition, FieldDefinitionPatch, FieldKind, NewFieldDefinition};
pub use registry::{MergePolicy, ScopeRequirement, SettingDescriptor, SettingRegistry};
pub use scope::{Scope, TenantId};
pub use target_type::{TargetType, UnknownTargetType};

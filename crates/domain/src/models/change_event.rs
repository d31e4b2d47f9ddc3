//! Change events emitted by store mutations.

use serde::{Deserialize, Serialize};

use super::scope::Scope;
use super::target_type::TargetType;

/// Kind of configuration record that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Setting,
    FieldDefinition,
    EnumDefinition,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Setting => write!(f, "setting"),
            EntityKind::FieldDefinition => write!(f, "field_definition"),
            EntityKind::EnumDefinition => write!(f, "enum_definition"),
        }
    }
}

/// Describes one successful write or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChangeEvent {
    pub entity: EntityKind,
    /// Setting key, field name or enum name.
    pub key: String,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl ChangeEvent {
    pub fn setting(key: impl Into<String>, scope: Scope, version: Option<i64>) -> Self {
        Self {
            entity: EntityKind::Setting,
            key: key.into(),
            scope,
            target_type: None,
            version,
        }
    }

    pub fn field(name: impl Into<String>, scope: Scope, target_type: TargetType) -> Self {
        Self {
            entity: EntityKind::FieldDefinition,
            key: name.into(),
            scope,
            target_type: Some(target_type),
            version: None,
        }
    }

    pub fn enumeration(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            entity: EntityKind::EnumDefinition,
            key: name.into(),
            scope,
            target_type: None,
            version: None,
        }
    }
}

//! Dynamic enum definitions: named, ordered option lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::scope::Scope;
use super::target_type::TargetType;
use crate::error::DomainError;

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumOption {
    pub value: String,
    pub label: String,
}

impl EnumOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A stored enum definition in one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnumDefinition {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<TargetType>,
    pub options: Vec<EnumOption>,
    pub sort: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing an enum definition.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NewEnumDefinition {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Label must be 1-255 characters"))]
    pub label: String,
    #[serde(default)]
    pub applies_to: Option<TargetType>,
    pub options: Vec<EnumOption>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100000, message = "Sort must be 0-100000"))]
    pub sort: i32,
}

impl NewEnumDefinition {
    /// Runs field validation plus name and option checks.
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()?;
        shared::validation::validate_name(&self.name)?;
        shared::validation::validate_option_values(self.options.iter().map(|o| o.value.as_str()))?;
        Ok(())
    }
}

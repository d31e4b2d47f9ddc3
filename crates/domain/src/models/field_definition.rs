//! Custom field definitions attached to target entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::enum_definition::EnumOption;
use super::scope::Scope;
use super::target_type::TargetType;
use crate::error::DomainError;

/// Upper bound for file and image uploads, in kilobytes.
pub const MAX_FILE_SIZE_KB: u32 = 51_200;

/// Kind of a custom field with its type-specific constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
    Textarea {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Email,
    Phone,
    Date,
    Checkbox,
    Select {
        options: Vec<EnumOption>,
    },
    MultiSelect {
        options: Vec<EnumOption>,
    },
    Radio {
        options: Vec<EnumOption>,
    },
    File {
        max_file_size_kb: u32,
        allowed_extensions: Vec<String>,
    },
    Image {
        max_file_size_kb: u32,
        allowed_extensions: Vec<String>,
    },
}

impl FieldKind {
    /// Wire name of the kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Textarea { .. } => "textarea",
            FieldKind::Number { .. } => "number",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Select { .. } => "select",
            FieldKind::MultiSelect { .. } => "multi_select",
            FieldKind::Radio { .. } => "radio",
            FieldKind::File { .. } => "file",
            FieldKind::Image { .. } => "image",
        }
    }

    pub fn options(&self) -> Option<&[EnumOption]> {
        match self {
            FieldKind::Select { options }
            | FieldKind::MultiSelect { options }
            | FieldKind::Radio { options } => Some(options),
            _ => None,
        }
    }

    pub fn max_file_size_kb(&self) -> Option<u32> {
        match self {
            FieldKind::File {
                max_file_size_kb, ..
            }
            | FieldKind::Image {
                max_file_size_kb, ..
            } => Some(*max_file_size_kb),
            _ => None,
        }
    }

    /// Validates the type-specific constraints.
    pub fn validate_constraints(&self) -> Result<(), ValidationError> {
        match self {
            FieldKind::Number {
                min: Some(min),
                max: Some(max),
            } if min > max => {
                let mut err = ValidationError::new("number_range");
                err.message = Some("Minimum cannot exceed maximum".into());
                Err(err)
            }
            FieldKind::Select { options }
            | FieldKind::MultiSelect { options }
            | FieldKind::Radio { options } => {
                if options.is_empty() {
                    let mut err = ValidationError::new("options_empty");
                    err.message = Some("Choice fields require at least one option".into());
                    return Err(err);
                }
                shared::validation::validate_option_values(options.iter().map(|o| o.value.as_str()))
            }
            FieldKind::File {
                max_file_size_kb,
                allowed_extensions,
            }
            | FieldKind::Image {
                max_file_size_kb,
                allowed_extensions,
            } => {
                if *max_file_size_kb == 0 || *max_file_size_kb > MAX_FILE_SIZE_KB {
                    let mut err = ValidationError::new("file_size_range");
                    err.message = Some(
                        format!("Max file size must be 1-{} KB", MAX_FILE_SIZE_KB).into(),
                    );
                    return Err(err);
                }
                shared::validation::validate_extensions(allowed_extensions)
            }
            _ => Ok(()),
        }
    }
}

/// A stored custom field definition in one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FieldDefinition {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub scope: Scope,
    pub target_type: TargetType,
    pub kind: FieldKind,
    pub sort: i32,
    pub required: bool,
    pub rules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// Inactive fields stay listed for admins but are skipped by form renderers.
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a field definition.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NewFieldDefinition {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Label must be 1-255 characters"))]
    pub label: String,
    pub target_type: TargetType,
    pub kind: FieldKind,
    #[serde(default)]
    #[validate(range(min = 0, max = 100000, message = "Sort must be 0-100000"))]
    pub sort: i32,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "Placeholder must be at most 255 characters"))]
    pub placeholder: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Help text must be at most 1000 characters"))]
    pub help_text: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewFieldDefinition {
    /// Runs field validation plus name and kind constraint checks.
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()?;
        shared::validation::validate_name(&self.name)?;
        self.kind.validate_constraints()?;
        Ok(())
    }
}

/// Partial update of a field definition. The name is immutable because it
/// links tenant overrides to global definitions.
///
/// `placeholder` and `help_text` distinguish an absent key (unchanged) from
/// an explicit `null` (cleared).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct FieldDefinitionPatch {
    #[validate(length(min = 1, max = 255, message = "Label must be 1-255 characters"))]
    pub label: Option<String>,
    pub kind: Option<FieldKind>,
    #[validate(range(min = 0, max = 100000, message = "Sort must be 0-100000"))]
    pub sort: Option<i32>,
    pub required: Option<bool>,
    pub rules: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 255, message = "Placeholder must be at most 255 characters"))]
    pub placeholder: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 1000, message = "Help text must be at most 1000 characters"))]
    pub help_text: Option<Option<String>>,
    pub is_active: Option<bool>,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl FieldDefinitionPatch {
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()?;
        if let Some(kind) = &self.kind {
            kind.validate_constraints()?;
        }
        Ok(())
    }

    /// Applies the patch to a definition in place.
    pub fn apply_to(&self, definition: &mut FieldDefinition) {
        if let Some(label) = &self.label {
            definition.label = label.clone();
        }
        if let Some(kind) = &self.kind {
            definition.kind = kind.clone();
        }
        if let Some(sort) = self.sort {
            definition.sort = sort;
        }
        if let Some(required) = self.required {
            definition.required = required;
        }
        if let Some(rules) = &self.rules {
            definition.rules = rules.clone();
        }
        if let Some(placeholder) = &self.placeholder {
            definition.placeholder = placeholder.clone();
        }
        if let Some(help_text) = &self.help_text {
            definition.help_text = help_text.clone();
        }
        if let Some(is_active) = self.is_active {
            definition.is_active = is_active;
        }
    }
}

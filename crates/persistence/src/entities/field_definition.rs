//! Field definition entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{FieldDefinition, FieldKind, Scope, TargetType};
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::corrupt_row;

/// Database row mapping for the field_definitions table.
///
/// `kind` holds the serialized [`FieldKind`] including its constraints.
#[derive(Debug, Clone, FromRow)]
pub struct FieldDefinitionEntity {
    pub id: i64,
    pub tenant_id: Option<Uuid>,
    pub target_type: String,
    pub name: String,
    pub label: String,
    pub kind: serde_json::Value,
    pub sort: i32,
    pub required: bool,
    pub rules: Vec<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FieldDefinitionEntity> for FieldDefinition {
    type Error = StoreError;

    fn try_from(entity: FieldDefinitionEntity) -> Result<Self, Self::Error> {
        let target_type: TargetType = entity
            .target_type
            .parse()
            .map_err(|e| corrupt_row("field_definitions", e))?;
        let kind: FieldKind = serde_json::from_value(entity.kind)
            .map_err(|e| corrupt_row("field_definitions", e))?;

        Ok(Self {
            id: entity.id,
            name: entity.name,
            label: entity.label,
            scope: Scope::from_tenant_column(entity.tenant_id),
            target_type,
            kind,
            sort: entity.sort,
            required: entity.required,
            rules: entity.rules,
            placeholder: entity.placeholder,
            help_text: entity.help_text,
            is_active: entity.is_active,
            deleted_at: entity.deleted_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

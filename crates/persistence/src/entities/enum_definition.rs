//! Enum definition entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{EnumDefinition, EnumOption, Scope, TargetType};
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::corrupt_row;

/// Database row mapping for the enum_definitions table.
#[derive(Debug, Clone, FromRow)]
pub struct EnumDefinitionEntity {
    pub id: i64,
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub label: String,
    pub applies_to: Option<String>,
    pub options: serde_json::Value,
    pub sort: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EnumDefinitionEntity> for EnumDefinition {
    type Error = StoreError;

    fn try_from(entity: EnumDefinitionEntity) -> Result<Self, Self::Error> {
        let applies_to = entity
            .applies_to
            .as_deref()
            .map(str::parse::<TargetType>)
            .transpose()
            .map_err(|e| corrupt_row("enum_definitions", e))?;
        let options: Vec<EnumOption> = serde_json::from_value(entity.options)
            .map_err(|e| corrupt_row("enum_definitions", e))?;

        Ok(Self {
            id: entity.id,
            name: entity.name,
            label: entity.label,
            scope: Scope::from_tenant_column(entity.tenant_id),
            applies_to,
            options,
            sort: entity.sort,
            deleted_at: entity.deleted_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_maps_options() {
        let tenant = Uuid::new_v4();
        let entity = EnumDefinitionEntity {
            id: 3,
            tenant_id: Some(tenant),
            name: "blood_group".to_string(),
            label: "Blood group".to_string(),
            applies_to: Some("student".to_string()),
            options: json!([{"value": "a_pos", "label": "A+"}, {"value": "o_neg", "label": "O-"}]),
            sort: 0,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let def = EnumDefinition::try_from(entity).unwrap();
        assert_eq!(def.applies_to, Some(TargetType::Student));
        assert_eq!(def.options[1], EnumOption::new("o_neg", "O-"));
        assert_eq!(def.scope.tenant_column(), Some(tenant));
    }
}

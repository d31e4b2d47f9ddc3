//! Config override entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{settings_map, ConfigEntry, Scope};
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::corrupt_row;

/// Database row mapping for the config_overrides table.
#[derive(Debug, Clone, FromRow)]
pub struct ConfigOverrideEntity {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub key: String,
    pub value: serde_json::Value,
    pub version: i64,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ConfigOverrideEntity> for ConfigEntry {
    type Error = StoreError;

    fn try_from(entity: ConfigOverrideEntity) -> Result<Self, Self::Error> {
        let value = settings_map(entity.value).ok_or_else(|| {
            corrupt_row("config_overrides", format!("value of {} is not an object", entity.key))
        })?;

        Ok(Self {
            id: entity.id,
            key: entity.key,
            scope: Scope::from_tenant_column(entity.tenant_id),
            value,
            version: entity.version,
            updated_by: entity.updated_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

//! Config override repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use super::ScopeFilter;
use crate::entities::ConfigOverrideEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, tenant_id, key, value, version, updated_by, created_at, updated_at";

/// Repository for scoped setting records.
#[derive(Clone)]
pub struct ConfigOverrideRepository {
    pool: PgPool,
}

impl ConfigOverrideRepository {
    /// Creates a new ConfigOverrideRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the record for a key in one scope (`None` tenant means global).
    pub async fn find(
        &self,
        key: &str,
        tenant_id: Option<Uuid>,
    ) -> Result<Option<ConfigOverrideEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_config_override");
        let result = sqlx::query_as::<_, ConfigOverrideEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM config_overrides
            WHERE key = $1 AND tenant_id IS NOT DISTINCT FROM $2
            "#
        ))
        .bind(key)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the records for a key in any of the filtered scopes.
    pub async fn find_in_scopes(
        &self,
        key: &str,
        filter: &ScopeFilter,
    ) -> Result<Vec<ConfigOverrideEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_config_overrides_in_scopes");
        let result = sqlx::query_as::<_, ConfigOverrideEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM config_overrides
            WHERE key = $1
              AND ((tenant_id IS NULL AND $2) OR tenant_id = ANY($3))
            "#
        ))
        .bind(key)
        .bind(filter.include_global)
        .bind(&filter.tenant_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List every record in one scope, ordered by key.
    pub async fn list(&self, tenant_id: Option<Uuid>) -> Result<Vec<ConfigOverrideEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_config_overrides");
        let result = sqlx::query_as::<_, ConfigOverrideEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM config_overrides
            WHERE tenant_id IS NOT DISTINCT FROM $1
            ORDER BY key
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Upsert a global record, incrementing its version on update.
    pub async fn upsert_global(
        &self,
        key: &str,
        value: serde_json::Value,
        updated_by: Uuid,
    ) -> Result<ConfigOverrideEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_global_config_override");
        let result = sqlx::query_as::<_, ConfigOverrideEntity>(&format!(
            r#"
            INSERT INTO config_overrides (id, tenant_id, key, value, version, updated_by)
            VALUES ($1, NULL, $2, $3, 1, $4)
            ON CONFLICT (key) WHERE tenant_id IS NULL
            DO UPDATE SET value = EXCLUDED.value,
                          version = config_overrides.version + 1,
                          updated_by = EXCLUDED.updated_by,
                          updated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Upsert a tenant record, incrementing its version on update.
    pub async fn upsert_tenant(
        &self,
        tenant_id: Uuid,
        key: &str,
        value: serde_json::Value,
        updated_by: Uuid,
    ) -> Result<ConfigOverrideEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_tenant_config_override");
        let result = sqlx::query_as::<_, ConfigOverrideEntity>(&format!(
            r#"
            INSERT INTO config_overrides (id, tenant_id, key, value, version, updated_by)
            VALUES ($1, $2, $3, $4, 1, $5)
            ON CONFLICT (tenant_id, key) WHERE tenant_id IS NOT NULL
            DO UPDATE SET value = EXCLUDED.value,
                          version = config_overrides.version + 1,
                          updated_by = EXCLUDED.updated_by,
                          updated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete the record for a key in one scope, returning its last version.
    pub async fn delete(&self, key: &str, tenant_id: Option<Uuid>) -> Result<Option<i64>, sqlx::Error> {
        let timer = QueryTimer::new("delete_config_override");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            DELETE FROM config_overrides
            WHERE key = $1 AND tenant_id IS NOT DISTINCT FROM $2
            RETURNING version
            "#,
        )
        .bind(key)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

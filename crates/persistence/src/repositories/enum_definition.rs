//! Enum definition repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use super::ScopeFilter;
use crate::entities::EnumDefinitionEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str =
    "id, tenant_id, name, label, applies_to, options, sort, deleted_at, created_at, updated_at";

/// Repository for dynamic enum definitions.
#[derive(Clone)]
pub struct EnumDefinitionRepository {
    pool: PgPool,
}

impl EnumDefinitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Non-deleted definitions in any of the filtered scopes.
    pub async fn list(&self, filter: &ScopeFilter) -> Result<Vec<EnumDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_enum_definitions");
        let result = sqlx::query_as::<_, EnumDefinitionEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM enum_definitions
            WHERE deleted_at IS NULL
              AND ((tenant_id IS NULL AND $1) OR tenant_id = ANY($2))
            ORDER BY sort, id
            "#
        ))
        .bind(filter.include_global)
        .bind(&filter.tenant_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a live definition by name in one scope.
    pub async fn find(
        &self,
        name: &str,
        tenant_id: Option<Uuid>,
    ) -> Result<Option<EnumDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_enum_definition");
        let result = sqlx::query_as::<_, EnumDefinitionEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM enum_definitions
            WHERE name = $1 AND tenant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL
            "#
        ))
        .bind(name)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create or replace the live global definition with this name.
    pub async fn upsert_global(
        &self,
        name: &str,
        label: &str,
        applies_to: Option<&str>,
        options: serde_json::Value,
        sort: i32,
    ) -> Result<EnumDefinitionEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_global_enum_definition");
        let result = sqlx::query_as::<_, EnumDefinitionEntity>(&format!(
            r#"
            INSERT INTO enum_definitions (tenant_id, name, label, applies_to, options, sort)
            VALUES (NULL, $1, $2, $3, $4, $5)
            ON CONFLICT (name) WHERE tenant_id IS NULL AND deleted_at IS NULL
            DO UPDATE SET label = EXCLUDED.label,
                          applies_to = EXCLUDED.applies_to,
                          options = EXCLUDED.options,
                          sort = EXCLUDED.sort,
                          updated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(name)
        .bind(label)
        .bind(applies_to)
        .bind(options)
        .bind(sort)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create or replace the live tenant definition with this name.
    pub async fn upsert_tenant(
        &self,
        tenant_id: Uuid,
        name: &str,
        label: &str,
        applies_to: Option<&str>,
        options: serde_json::Value,
        sort: i32,
    ) -> Result<EnumDefinitionEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_tenant_enum_definition");
        let result = sqlx::query_as::<_, EnumDefinitionEntity>(&format!(
            r#"
            INSERT INTO enum_definitions (tenant_id, name, label, applies_to, options, sort)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id, name) WHERE tenant_id IS NOT NULL AND deleted_at IS NULL
            DO UPDATE SET label = EXCLUDED.label,
                          applies_to = EXCLUDED.applies_to,
                          options = EXCLUDED.options,
                          sort = EXCLUDED.sort,
                          updated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(name)
        .bind(label)
        .bind(applies_to)
        .bind(options)
        .bind(sort)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Mark the live definition with this name in one scope as deleted.
    pub async fn soft_delete(&self, name: &str, tenant_id: Option<Uuid>) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_enum_definition");
        let result = sqlx::query(
            r#"
            UPDATE enum_definitions
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE name = $1 AND tenant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .bind(tenant_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }

    /// Remove the live definition with this name in one scope.
    pub async fn hard_delete(&self, name: &str, tenant_id: Option<Uuid>) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("hard_delete_enum_definition");
        let result = sqlx::query(
            r#"
            DELETE FROM enum_definitions
            WHERE name = $1 AND tenant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .bind(tenant_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }
}

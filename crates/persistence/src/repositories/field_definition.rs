//! Field definition repository for database operations.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ScopeFilter;
use crate::entities::FieldDefinitionEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, tenant_id, target_type, name, label, kind, sort, required, rules, \
                       placeholder, help_text, is_active, deleted_at, created_at, updated_at";

/// Values written when creating or updating a field definition row.
#[derive(Debug, Clone)]
pub struct FieldDefinitionRow {
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
}

/// Repository for custom field definitions.
#[derive(Clone)]
pub struct FieldDefinitionRepository {
    pool: PgPool,
}

impl FieldDefinitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Non-deleted definitions of a target type in any of the filtered scopes.
    pub async fn list(
        &self,
        target_type: &str,
        filter: &ScopeFilter,
    ) -> Result<Vec<FieldDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_field_definitions");
        let result = sqlx::query_as::<_, FieldDefinitionEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM field_definitions
            WHERE target_type = $1
              AND deleted_at IS NULL
              AND ((tenant_id IS NULL AND $2) OR tenant_id = ANY($3))
            ORDER BY sort, id
            "#
        ))
        .bind(target_type)
        .bind(filter.include_global)
        .bind(&filter.tenant_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a non-deleted definition by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<FieldDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_field_definition_by_id");
        let result = sqlx::query_as::<_, FieldDefinitionEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM field_definitions
            WHERE id = $1 AND deleted_at IS NULL
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a definition. A duplicate live name in the same scope and
    /// target type violates a partial unique index.
    pub async fn insert(
        &self,
        tenant_id: Option<Uuid>,
        row: FieldDefinitionRow,
    ) -> Result<FieldDefinitionEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_field_definition");
        let result = sqlx::query_as::<_, FieldDefinitionEntity>(&format!(
            r#"
            INSERT INTO field_definitions
                (tenant_id, target_type, name, label, kind, sort, required, rules,
                 placeholder, help_text, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(row.target_type)
        .bind(row.name)
        .bind(row.label)
        .bind(row.kind)
        .bind(row.sort)
        .bind(row.required)
        .bind(row.rules)
        .bind(row.placeholder)
        .bind(row.help_text)
        .bind(row.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Open a transaction for a locked read-modify-write.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Find a live definition owned by the given scope and lock it until the
    /// transaction ends.
    pub async fn find_for_update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i64,
        tenant_id: Option<Uuid>,
    ) -> Result<Option<FieldDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_field_definition");
        let result = sqlx::query_as::<_, FieldDefinitionEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM field_definitions
            WHERE id = $1 AND tenant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL
            FOR UPDATE
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await;
        timer.record();
        result
    }

    /// Overwrite the mutable columns of a row locked by `find_for_update`.
    pub async fn update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i64,
        tenant_id: Option<Uuid>,
        row: FieldDefinitionRow,
    ) -> Result<Option<FieldDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_field_definition");
        let result = sqlx::query_as::<_, FieldDefinitionEntity>(&format!(
            r#"
            UPDATE field_definitions
            SET label = $3, kind = $4, sort = $5, required = $6, rules = $7,
                placeholder = $8, help_text = $9, is_active = $10, updated_at = NOW()
            WHERE id = $1 AND tenant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(row.label)
        .bind(row.kind)
        .bind(row.sort)
        .bind(row.required)
        .bind(row.rules)
        .bind(row.placeholder)
        .bind(row.help_text)
        .bind(row.is_active)
        .fetch_optional(&mut **tx)
        .await;
        timer.record();
        result
    }

    /// Mark a live definition owned by the given scope as deleted.
    pub async fn soft_delete(
        &self,
        id: i64,
        tenant_id: Option<Uuid>,
    ) -> Result<Option<FieldDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_field_definition");
        let result = sqlx::query_as::<_, FieldDefinitionEntity>(&format!(
            r#"
            UPDATE field_definitions
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove a live definition owned by the given scope.
    pub async fn hard_delete(
        &self,
        id: i64,
        tenant_id: Option<Uuid>,
    ) -> Result<Option<FieldDefinitionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("hard_delete_field_definition");
        let result = sqlx::query_as::<_, FieldDefinitionEntity>(&format!(
            r#"
            DELETE FROM field_definitions
            WHERE id = $1 AND tenant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update sort values of definitions owned by the given scope in one
    /// transaction. Returns the names that matched a live row.
    pub async fn reorder(
        &self,
        tenant_id: Option<Uuid>,
        target_type: &str,
        order: &[(String, i32)],
    ) -> Result<Vec<String>, sqlx::Error> {
        let timer = QueryTimer::new("reorder_field_definitions");
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(order.len());

        for (name, sort) in order {
            let rows = sqlx::query(
                r#"
                UPDATE field_definitions
                SET sort = $4, updated_at = NOW()
                WHERE tenant_id IS NOT DISTINCT FROM $1
                  AND target_type = $2
                  AND name = $3
                  AND deleted_at IS NULL
                "#,
            )
            .bind(tenant_id)
            .bind(target_type)
            .bind(name)
            .bind(sort)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if rows > 0 {
                updated.push(name.clone());
            }
        }

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }
}

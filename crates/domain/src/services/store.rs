//! Override store contract.
//!
//! Implementations persist settings, field definitions and enum definitions
//! keyed by scope. They hold no authorization logic: every mutation takes a
//! [`WritePermit`] and writes only to `permit.scope()`.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::{
    ChangeEvent, Committed, ConfigEntry, EnumDefinition, FieldDefinition, FieldDefinitionPatch,
    NewEnumDefinition, NewFieldDefinition, Scope, SettingsMap, TargetType,
};
use crate::services::mutation_guard::WritePermit;

/// How a definition is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Mark the row deleted; it stops participating in effective lists.
    #[default]
    Soft,
    /// Remove the row.
    Hard,
}

/// Result of a bulk sort-order update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderOutcome {
    /// Names whose sort value was updated.
    pub updated: Vec<String>,
    /// Names not owned in the permit's scope, left untouched.
    pub skipped: Vec<String>,
}

impl ReorderOutcome {
    /// Change events for the updated names.
    pub fn changes(&self, scope: Scope, target_type: TargetType) -> Vec<ChangeEvent> {
        self.updated
            .iter()
            .map(|name| ChangeEvent::field(name.clone(), scope, target_type))
            .collect()
    }
}

/// Durable storage of scoped configuration records.
#[async_trait::async_trait]
pub trait OverrideStore: Send + Sync {
    /// Point lookup of a setting in one scope. No merging.
    async fn get_entry(&self, key: &str, scope: Scope) -> Result<Option<ConfigEntry>, StoreError>;

    /// Settings for `key` in any of `scopes`.
    async fn get_entries(&self, key: &str, scopes: &[Scope]) -> Result<Vec<ConfigEntry>, StoreError>;

    /// Upserts a setting in the permit's scope, incrementing its version.
    async fn put_entry(
        &self,
        permit: &WritePermit,
        key: &str,
        value: SettingsMap,
    ) -> Result<Committed<ConfigEntry>, StoreError>;

    /// Removes a setting from the permit's scope. `None` when nothing was stored.
    async fn delete_entry(
        &self,
        permit: &WritePermit,
        key: &str,
    ) -> Result<Option<ChangeEvent>, StoreError>;

    /// All settings stored in one scope, ordered by key.
    async fn list_entries(&self, scope: Scope) -> Result<Vec<ConfigEntry>, StoreError>;

    /// Non-deleted field definitions of a target type in any of `scopes`.
    async fn list_fields(
        &self,
        target_type: TargetType,
        scopes: &[Scope],
    ) -> Result<Vec<FieldDefinition>, StoreError>;

    /// A non-deleted field definition by id.
    async fn get_field(&self, id: i64) -> Result<Option<FieldDefinition>, StoreError>;

    /// Creates a field definition in the permit's scope.
    ///
    /// Fails with `Conflict` when a non-deleted field with the same name and
    /// target type already exists in that scope.
    async fn insert_field(
        &self,
        permit: &WritePermit,
        field: NewFieldDefinition,
    ) -> Result<Committed<FieldDefinition>, StoreError>;

    /// Updates a field definition owned by the permit's scope.
    async fn update_field(
        &self,
        permit: &WritePermit,
        id: i64,
        patch: FieldDefinitionPatch,
    ) -> Result<Committed<FieldDefinition>, StoreError>;

    /// Deletes a field definition owned by the permit's scope.
    async fn delete_field(
        &self,
        permit: &WritePermit,
        id: i64,
        mode: DeleteMode,
    ) -> Result<ChangeEvent, StoreError>;

    /// Sets sort values of fields owned by the permit's scope in one
    /// transaction. Names without a row in that scope are reported as skipped.
    async fn reorder_fields(
        &self,
        permit: &WritePermit,
        target_type: TargetType,
        order: &[(String, i32)],
    ) -> Result<ReorderOutcome, StoreError>;

    /// Non-deleted enum definitions in any of `scopes`.
    async fn list_enums(&self, scopes: &[Scope]) -> Result<Vec<EnumDefinition>, StoreError>;

    /// A non-deleted enum definition by name in one scope.
    async fn get_enum(&self, name: &str, scope: Scope) -> Result<Option<EnumDefinition>, StoreError>;

    /// Creates or replaces an enum definition in the permit's scope.
    async fn put_enum(
        &self,
        permit: &WritePermit,
        definition: NewEnumDefinition,
    ) -> Result<Committed<EnumDefinition>, StoreError>;

    /// Deletes an enum definition from the permit's scope. `None` when nothing was stored.
    async fn delete_enum(
        &self,
        permit: &WritePermit,
        name: &str,
        mode: DeleteMode,
    ) -> Result<Option<ChangeEvent>, StoreError>;
}

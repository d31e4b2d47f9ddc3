//! In-memory override store for tests and embedded callers.

use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    ChangeEvent, Committed, ConfigEntry, EnumDefinition, FieldDefinition, FieldDefinitionPatch,
    NewEnumDefinition, NewFieldDefinition, Scope, SettingsMap, TargetType,
};
use crate::services::mutation_guard::WritePermit;
use crate::services::store::{DeleteMode, OverrideStore, ReorderOutcome};

#[derive(Debug, Default)]
struct State {
    entries: HashMap<(Scope, String), ConfigEntry>,
    fields: Vec<FieldDefinition>,
    enums: Vec<EnumDefinition>,
    next_field_id: i64,
    next_enum_id: i64,
}

impl State {
    fn live_field_mut(&mut self, id: i64, scope: Scope) -> Option<&mut FieldDefinition> {
        self.fields
            .iter_mut()
            .find(|f| f.id == id && f.scope == scope && f.deleted_at.is_none())
    }
}

/// Override store holding everything behind one lock.
///
/// Every operation takes the lock once, so each mutation is atomic.
#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    state: RwLock<State>,
    /// Whether to simulate backend failures for testing.
    pub simulate_failure: bool,
}

impl InMemoryOverrideStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every call fails with a backend error.
    pub fn failing() -> Self {
        Self {
            state: RwLock::default(),
            simulate_failure: true,
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.simulate_failure {
            tracing::warn!("In-memory store simulating failure");
            return Err(StoreError::Backend("Simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl OverrideStore for InMemoryOverrideStore {
    async fn get_entry(&self, key: &str, scope: Scope) -> Result<Option<ConfigEntry>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.entries.get(&(scope, key.to_string())).cloned())
    }

    async fn get_entries(&self, key: &str, scopes: &[Scope]) -> Result<Vec<ConfigEntry>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(scopes
            .iter()
            .filter_map(|scope| state.entries.get(&(*scope, key.to_string())).cloned())
            .collect())
    }

    async fn put_entry(
        &self,
        permit: &WritePermit,
        key: &str,
        value: SettingsMap,
    ) -> Result<Committed<ConfigEntry>, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let now = Utc::now();
        let mut state = self.state.write().await;

        let entry = state
            .entries
            .entry((scope, key.to_string()))
            .and_modify(|existing| {
                existing.value = value.clone();
                existing.version += 1;
                existing.updated_by = Some(permit.actor_id());
                existing.updated_at = now;
            })
            .or_insert_with(|| ConfigEntry {
                id: Uuid::new_v4(),
                key: key.to_string(),
                scope,
                value: value.clone(),
                version: 1,
                updated_by: Some(permit.actor_id()),
                created_at: now,
                updated_at: now,
            })
            .clone();

        let change = ChangeEvent::setting(key, scope, Some(entry.version));
        Ok(Committed::new(entry, change))
    }

    async fn delete_entry(
        &self,
        permit: &WritePermit,
        key: &str,
    ) -> Result<Option<ChangeEvent>, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let mut state = self.state.write().await;
        Ok(state
            .entries
            .remove(&(scope, key.to_string()))
            .map(|removed| ChangeEvent::setting(key, scope, Some(removed.version))))
    }

    async fn list_entries(&self, scope: Scope) -> Result<Vec<ConfigEntry>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut entries: Vec<ConfigEntry> = state
            .entries
            .values()
            .filter(|e| e.scope == scope)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn list_fields(
        &self,
        target_type: TargetType,
        scopes: &[Scope],
    ) -> Result<Vec<FieldDefinition>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .fields
            .iter()
            .filter(|f| {
                f.target_type == target_type && f.deleted_at.is_none() && scopes.contains(&f.scope)
            })
            .cloned()
            .collect())
    }

    async fn get_field(&self, id: i64) -> Result<Option<FieldDefinition>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .fields
            .iter()
            .find(|f| f.id == id && f.deleted_at.is_none())
            .cloned())
    }

    async fn insert_field(
        &self,
        permit: &WritePermit,
        field: NewFieldDefinition,
    ) -> Result<Committed<FieldDefinition>, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let mut state = self.state.write().await;

        let duplicate = state.fields.iter().any(|f| {
            f.scope == scope
                && f.target_type == field.target_type
                && f.name == field.name
                && f.deleted_at.is_none()
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "Field '{}' already exists for {} in {}",
                field.name, field.target_type, scope
            )));
        }

        state.next_field_id += 1;
        let now = Utc::now();
        let definition = FieldDefinition {
            id: state.next_field_id,
            name: field.name,
            label: field.label,
            scope,
            target_type: field.target_type,
            kind: field.kind,
            sort: field.sort,
            required: field.required,
            rules: field.rules,
            placeholder: field.placeholder,
            help_text: field.help_text,
            is_active: field.is_active,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        state.fields.push(definition.clone());

        let change = ChangeEvent::field(definition.name.clone(), scope, definition.target_type);
        Ok(Committed::new(definition, change))
    }

    async fn update_field(
        &self,
        permit: &WritePermit,
        id: i64,
        patch: FieldDefinitionPatch,
    ) -> Result<Committed<FieldDefinition>, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let mut state = self.state.write().await;

        let definition = state
            .live_field_mut(id, scope)
            .ok_or_else(|| StoreError::NotFound(format!("Field {} in {}", id, scope)))?;
        patch.apply_to(definition);
        definition.updated_at = Utc::now();
        let updated = definition.clone();

        let change = ChangeEvent::field(updated.name.clone(), scope, updated.target_type);
        Ok(Committed::new(updated, change))
    }

    async fn delete_field(
        &self,
        permit: &WritePermit,
        id: i64,
        mode: DeleteMode,
    ) -> Result<ChangeEvent, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let mut state = self.state.write().await;

        let index = state
            .fields
            .iter()
            .position(|f| f.id == id && f.scope == scope && f.deleted_at.is_none())
            .ok_or_else(|| StoreError::NotFound(format!("Field {} in {}", id, scope)))?;
        let change = ChangeEvent::field(
            state.fields[index].name.clone(),
            scope,
            state.fields[index].target_type,
        );

        match mode {
            DeleteMode::Soft => {
                let now = Utc::now();
                state.fields[index].deleted_at = Some(now);
                state.fields[index].updated_at = now;
            }
            DeleteMode::Hard => {
                state.fields.remove(index);
            }
        }
        Ok(change)
    }

    async fn reorder_fields(
        &self,
        permit: &WritePermit,
        target_type: TargetType,
        order: &[(String, i32)],
    ) -> Result<ReorderOutcome, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let now = Utc::now();
        let mut state = self.state.write().await;
        let mut outcome = ReorderOutcome::default();

        for (name, sort) in order {
            let owned = state.fields.iter_mut().find(|f| {
                f.scope == scope
                    && f.target_type == target_type
                    && &f.name == name
                    && f.deleted_at.is_none()
            });
            match owned {
                Some(definition) => {
                    definition.sort = *sort;
                    definition.updated_at = now;
                    outcome.updated.push(name.clone());
                }
                None => outcome.skipped.push(name.clone()),
            }
        }
        Ok(outcome)
    }

    async fn list_enums(&self, scopes: &[Scope]) -> Result<Vec<EnumDefinition>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .enums
            .iter()
            .filter(|e| e.deleted_at.is_none() && scopes.contains(&e.scope))
            .cloned()
            .collect())
    }

    async fn get_enum(&self, name: &str, scope: Scope) -> Result<Option<EnumDefinition>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .enums
            .iter()
            .find(|e| e.name == name && e.scope == scope && e.deleted_at.is_none())
            .cloned())
    }

    async fn put_enum(
        &self,
        permit: &WritePermit,
        definition: NewEnumDefinition,
    ) -> Result<Committed<EnumDefinition>, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let now = Utc::now();
        let mut state = self.state.write().await;

        let existing = state
            .enums
            .iter_mut()
            .find(|e| e.name == definition.name && e.scope == scope && e.deleted_at.is_none());

        let stored = match existing {
            Some(current) => {
                current.label = definition.label;
                current.applies_to = definition.applies_to;
                current.options = definition.options;
                current.sort = definition.sort;
                current.updated_at = now;
                current.clone()
            }
            None => {
                state.next_enum_id += 1;
                let created = EnumDefinition {
                    id: state.next_enum_id,
                    name: definition.name,
                    label: definition.label,
                    scope,
                    applies_to: definition.applies_to,
                    options: definition.options,
                    sort: definition.sort,
                    deleted_at: None,
                    created_at: now,
                    updated_at: now,
                };
                state.enums.push(created.clone());
                created
            }
        };

        let change = ChangeEvent::enumeration(stored.name.clone(), scope);
        Ok(Committed::new(stored, change))
    }

    async fn delete_enum(
        &self,
        permit: &WritePermit,
        name: &str,
        mode: DeleteMode,
    ) -> Result<Option<ChangeEvent>, StoreError> {
        self.check_available()?;
        let scope = permit.scope();
        let mut state = self.state.write().await;

        let position = state
            .enums
            .iter()
            .position(|e| e.name == name && e.scope == scope && e.deleted_at.is_none());
        let Some(index) = position else {
            return Ok(None);
        };

        match mode {
            DeleteMode::Soft => {
                let now = Utc::now();
                state.enums[index].deleted_at = Some(now);
                state.enums[index].updated_at = now;
            }
            DeleteMode::Hard => {
                state.enums.remove(index);
            }
        }
        Ok(Some(ChangeEvent::enumeration(name, scope)))
    }
}

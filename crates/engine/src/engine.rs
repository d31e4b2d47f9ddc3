//! The settings engine facade.
//!
//! Reads go cache first, fall through to the override store on a miss and
//! run the pure resolvers over the rows. Writes are authorized by the
//! mutation guard, committed by the store and invalidate the derived cache
//! tags before returning, so a write followed by a read observes the write.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use domain::models::{
    ChangeEvent, ConfigEntry, EnumDefinition, EnumOption, FieldDefinition, FieldDefinitionPatch,
    NewEnumDefinition, NewFieldDefinition, Scope, ScopeRequirement, SettingRegistry, SettingsMap,
    TargetType, TenantId,
};
use domain::services::{
    active_fields, authorize_delete, authorize_write, effective_definition, effective_definitions,
    resolution_view, resolve_setting, CacheSubject, DeleteMode, DenialReason,
    InMemoryOverrideStore, OverrideStore, ReorderOutcome, Resolution, ResolvedSetting,
    SettingResolutionInput,
};
use persistence::{CacheConfig, CacheLayer, CacheStats};

use crate::context::RequestContext;
use crate::error::EngineError;

/// Effective-configuration engine shared by all request handlers.
pub struct SettingsEngine {
    store: Arc<dyn OverrideStore>,
    registry: Arc<SettingRegistry>,
    cache: CacheLayer,
}

impl SettingsEngine {
    pub fn new(store: Arc<dyn OverrideStore>, registry: Arc<SettingRegistry>, cache: CacheLayer) -> Self {
        Self {
            store,
            registry,
            cache,
        }
    }

    /// Engine over an in-memory store with the built-in registry and a
    /// default in-memory cache.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryOverrideStore::new()),
            Arc::new(SettingRegistry::builtin()),
            CacheLayer::from_config(&CacheConfig::default()),
        )
    }

    pub fn registry(&self) -> &SettingRegistry {
        &self.registry
    }

    /// Cache statistics; `None` when caching is disabled or unavailable.
    pub async fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.stats().await
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Effective value of `key` for the caller's tenant.
    ///
    /// A key with no tenant record, no global record and no static default
    /// is reported as `NotFound`.
    pub async fn get_effective_setting(
        &self,
        ctx: &RequestContext,
        key: &str,
    ) -> Result<SettingsMap, EngineError> {
        Ok(self.resolve_setting(ctx, key).await?.value)
    }

    /// Effective value of `key` together with where each part came from.
    pub async fn resolve_setting(
        &self,
        ctx: &RequestContext,
        key: &str,
    ) -> Result<ResolvedSetting, EngineError> {
        shared::validation::validate_setting_key(key)?;
        let view = resolution_view(key, self.registry.scope_for(key), ctx.current_tenant())?;

        let resolution = self
            .cache
            .get_or_compute(view, CacheSubject::Setting(key), || {
                self.load_resolution(key, view)
            })
            .await?;

        match resolution {
            Resolution::Resolved(resolved) => {
                counter!("settings_resolutions_total", "source" => resolved.source.to_string())
                    .increment(1);
                Ok(resolved)
            }
            Resolution::Unresolved { key } => {
                warn!(key = %key, tenant = ?view, "Setting has no value in any layer");
                counter!("settings_resolutions_total", "source" => "unresolved").increment(1);
                Err(EngineError::NotFound(format!("setting {}", key)))
            }
        }
    }

    async fn load_resolution(
        &self,
        key: &str,
        view: Option<TenantId>,
    ) -> Result<Resolution, EngineError> {
        let entries = self
            .store
            .get_entries(key, &Scope::lookup_chain(view))
            .await?;
        let tenant_entry = entries.iter().find(|e| !e.scope.is_global());
        let global_entry = entries.iter().find(|e| e.scope.is_global());

        Ok(resolve_setting(SettingResolutionInput {
            key,
            descriptor: self.registry.descriptor(key),
            tenant_entry,
            global_entry,
        }))
    }

    /// Saves `value` in the caller's scope: the current tenant, or global
    /// without a tenant context.
    pub async fn save_setting(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: SettingsMap,
    ) -> Result<ConfigEntry, EngineError> {
        self.save_setting_in(ctx, ctx.write_scope(), key, value).await
    }

    /// Saves `value` in an explicit scope.
    pub async fn save_setting_in(
        &self,
        ctx: &RequestContext,
        scope: Scope,
        key: &str,
        value: SettingsMap,
    ) -> Result<ConfigEntry, EngineError> {
        shared::validation::validate_setting_key(key)?;
        if !scope.is_global() && self.registry.scope_for(key) == ScopeRequirement::GlobalOnly {
            return Err(EngineError::Validation(format!(
                "{} is a system-wide setting and cannot be overridden per tenant",
                key
            )));
        }

        let permit = authorize_write(ctx.current_actor(), scope).into_permit()?;
        let committed = self.store.put_entry(&permit, key, value).await?;
        self.cache.apply(&committed.change).await;

        info!(
            key = %key,
            scope = %scope,
            version = committed.record.version,
            actor_id = %permit.actor_id(),
            "Setting saved"
        );
        Ok(committed.record)
    }

    /// Deletes the record of `key` in `scope`. Returns whether one existed.
    ///
    /// Deleting a tenant record reveals the global one.
    pub async fn delete_setting(
        &self,
        ctx: &RequestContext,
        scope: Scope,
        key: &str,
    ) -> Result<bool, EngineError> {
        shared::validation::validate_setting_key(key)?;
        let permit = authorize_delete(ctx.current_actor(), scope).into_permit()?;

        match self.store.delete_entry(&permit, key).await? {
            Some(change) => {
                self.cache.apply(&change).await;
                info!(key = %key, scope = %scope, actor_id = %permit.actor_id(), "Setting deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Raw stored records of one scope, for administration screens.
    pub async fn list_setting_records(
        &self,
        ctx: &RequestContext,
        scope: Scope,
    ) -> Result<Vec<ConfigEntry>, EngineError> {
        ensure_readable(ctx, scope)?;
        Ok(self.store.list_entries(scope).await?)
    }

    /// Writes every registry default as a global record where none exists.
    /// Returns the keys that were seeded.
    pub async fn seed_global_defaults(&self, ctx: &RequestContext) -> Result<Vec<String>, EngineError> {
        let permit = authorize_write(ctx.current_actor(), Scope::Global).into_permit()?;
        let mut seeded = Vec::new();
        let mut changes = Vec::new();

        for descriptor in self.registry.descriptors() {
            let Some(default) = &descriptor.default else {
                continue;
            };
            if self.store.get_entry(&descriptor.key, Scope::Global).await?.is_some() {
                debug!(key = %descriptor.key, "Global record exists, not seeding");
                continue;
            }
            let committed = self
                .store
                .put_entry(&permit, &descriptor.key, default.clone())
                .await?;
            seeded.push(descriptor.key.clone());
            changes.push(committed.change);
        }

        self.cache.apply_all(&changes).await;
        info!(
            registry_version = self.registry.version(),
            seeded = seeded.len(),
            "Global defaults seeded"
        );
        Ok(seeded)
    }

    // ------------------------------------------------------------------
    // Custom field definitions
    // ------------------------------------------------------------------

    /// Effective field definitions of a target type for the caller's tenant,
    /// ordered by sort then id.
    pub async fn list_effective_fields(
        &self,
        ctx: &RequestContext,
        target_type: TargetType,
    ) -> Result<Vec<FieldDefinition>, EngineError> {
        let tenant = ctx.current_tenant();
        self.cache
            .get_or_compute(tenant, CacheSubject::FieldDefinitions(target_type), || {
                self.load_fields(target_type, tenant)
            })
            .await
    }

    /// Effective field definitions that forms should render.
    pub async fn list_active_fields(
        &self,
        ctx: &RequestContext,
        target_type: TargetType,
    ) -> Result<Vec<FieldDefinition>, EngineError> {
        Ok(active_fields(self.list_effective_fields(ctx, target_type).await?))
    }

    async fn load_fields(
        &self,
        target_type: TargetType,
        tenant: Option<TenantId>,
    ) -> Result<Vec<FieldDefinition>, EngineError> {
        let rows = self
            .store
            .list_fields(target_type, &Scope::lookup_chain(tenant))
            .await?;
        Ok(effective_definitions(rows, tenant))
    }

    /// Creates a field definition in the caller's scope.
    pub async fn create_field_definition(
        &self,
        ctx: &RequestContext,
        field: NewFieldDefinition,
    ) -> Result<FieldDefinition, EngineError> {
        field.check()?;
        let scope = ctx.write_scope();
        let permit = authorize_write(ctx.current_actor(), scope).into_permit()?;

        let committed = self.store.insert_field(&permit, field).await?;
        self.cache.apply(&committed.change).await;

        info!(
            field_id = committed.record.id,
            name = %committed.record.name,
            target_type = %committed.record.target_type,
            scope = %scope,
            "Field definition created"
        );
        Ok(committed.record)
    }

    /// Updates a field definition. The caller must be allowed to write the
    /// scope that owns it; tenants override global fields by creating their
    /// own definition with the same name.
    pub async fn update_field_definition(
        &self,
        ctx: &RequestContext,
        id: i64,
        patch: FieldDefinitionPatch,
    ) -> Result<FieldDefinition, EngineError> {
        patch.check()?;
        let existing = self.find_field(id).await?;
        let permit = authorize_write(ctx.current_actor(), existing.scope).into_permit()?;

        let committed = self.store.update_field(&permit, id, patch).await?;
        self.cache.apply(&committed.change).await;

        info!(field_id = id, scope = %existing.scope, "Field definition updated");
        Ok(committed.record)
    }

    /// Deletes a field definition. A soft delete keeps the row for audit;
    /// either way a tenant override stops shadowing the global field.
    pub async fn delete_field_definition(
        &self,
        ctx: &RequestContext,
        id: i64,
        mode: DeleteMode,
    ) -> Result<(), EngineError> {
        let existing = self.find_field(id).await?;
        let permit = authorize_delete(ctx.current_actor(), existing.scope).into_permit()?;

        let change = self.store.delete_field(&permit, id, mode).await?;
        self.cache.apply(&change).await;

        info!(field_id = id, scope = %existing.scope, mode = ?mode, "Field definition deleted");
        Ok(())
    }

    async fn find_field(&self, id: i64) -> Result<FieldDefinition, EngineError> {
        self.store
            .get_field(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("field definition {}", id)))
    }

    /// Applies new sort values to the caller's own definitions. Names the
    /// caller's scope does not own are reported as skipped; applying the
    /// same order twice changes nothing.
    pub async fn reorder_field_definitions(
        &self,
        ctx: &RequestContext,
        target_type: TargetType,
        order: &BTreeMap<String, i32>,
    ) -> Result<ReorderOutcome, EngineError> {
        let scope = ctx.write_scope();
        let permit = authorize_write(ctx.current_actor(), scope).into_permit()?;
        let order: Vec<(String, i32)> = order.iter().map(|(n, s)| (n.clone(), *s)).collect();

        let outcome = self
            .store
            .reorder_fields(&permit, target_type, &order)
            .await?;
        self.cache.apply_all(&outcome.changes(scope, target_type)).await;

        if !outcome.skipped.is_empty() {
            debug!(skipped = ?outcome.skipped, scope = %scope, "Reorder skipped unowned names");
        }
        info!(
            target_type = %target_type,
            scope = %scope,
            updated = outcome.updated.len(),
            "Field definitions reordered"
        );
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Dynamic enums
    // ------------------------------------------------------------------

    /// The enum definition `name` as the caller's tenant sees it.
    pub async fn get_effective_enum(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Option<EnumDefinition>, EngineError> {
        let tenant = ctx.current_tenant();
        self.cache
            .get_or_compute(tenant, CacheSubject::EnumDefinition(name), || {
                self.load_enum(name, tenant)
            })
            .await
    }

    /// Options of the effective enum `name`; empty when none is defined.
    pub async fn list_effective_enum_options(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Vec<EnumOption>, EngineError> {
        Ok(self
            .get_effective_enum(ctx, name)
            .await?
            .map(|definition| definition.options)
            .unwrap_or_default())
    }

    /// Every enum definition visible to the caller's tenant.
    pub async fn list_effective_enums(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<EnumDefinition>, EngineError> {
        let tenant = ctx.current_tenant();
        self.cache
            .get_or_compute(tenant, CacheSubject::EnumCatalog, || self.load_enums(tenant))
            .await
    }

    async fn load_enum(
        &self,
        name: &str,
        tenant: Option<TenantId>,
    ) -> Result<Option<EnumDefinition>, EngineError> {
        let mut rows = Vec::new();
        for scope in Scope::lookup_chain(tenant) {
            if let Some(definition) = self.store.get_enum(name, scope).await? {
                rows.push(definition);
            }
        }
        Ok(effective_definition(rows, name, tenant))
    }

    async fn load_enums(&self, tenant: Option<TenantId>) -> Result<Vec<EnumDefinition>, EngineError> {
        let rows = self.store.list_enums(&Scope::lookup_chain(tenant)).await?;
        Ok(effective_definitions(rows, tenant))
    }

    /// Creates or replaces an enum definition in the caller's scope.
    pub async fn save_enum_definition(
        &self,
        ctx: &RequestContext,
        definition: NewEnumDefinition,
    ) -> Result<EnumDefinition, EngineError> {
        definition.check()?;
        let scope = ctx.write_scope();
        let permit = authorize_write(ctx.current_actor(), scope).into_permit()?;

        let committed = self.store.put_enum(&permit, definition).await?;
        self.cache.apply(&committed.change).await;

        info!(
            name = %committed.record.name,
            scope = %scope,
            options = committed.record.options.len(),
            "Enum definition saved"
        );
        Ok(committed.record)
    }

    /// Deletes the enum definition `name` in `scope`. Returns whether one existed.
    pub async fn delete_enum_definition(
        &self,
        ctx: &RequestContext,
        scope: Scope,
        name: &str,
        mode: DeleteMode,
    ) -> Result<bool, EngineError> {
        let permit = authorize_delete(ctx.current_actor(), scope).into_permit()?;

        let change: Option<ChangeEvent> = self.store.delete_enum(&permit, name, mode).await?;
        match change {
            Some(change) => {
                self.cache.apply(&change).await;
                info!(name = %name, scope = %scope, mode = ?mode, "Enum definition deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Tenant records are readable by that tenant's administrators only.
fn ensure_readable(ctx: &RequestContext, scope: Scope) -> Result<(), EngineError> {
    match scope {
        Scope::Global => Ok(()),
        Scope::Tenant(tenant) if ctx.current_actor().can_manage_tenant(tenant) => Ok(()),
        Scope::Tenant(tenant) => Err(EngineError::ScopeViolation(DenialReason::ForeignTenant(tenant))),
    }
}

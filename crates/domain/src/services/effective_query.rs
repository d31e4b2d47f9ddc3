//! Effective list configuration.
//!
//! Field and enum definitions may exist once globally and once per tenant
//! under the same name. The effective list for a tenant view keeps the
//! tenant row where both exist and orders the result by `sort`, then `id`.

use std::collections::HashSet;

use crate::models::{EnumDefinition, EnumOption, FieldDefinition, Scope, TenantId};

/// A named definition stored in one scope.
pub trait ScopedDefinition {
    fn name(&self) -> &str;
    fn scope(&self) -> Scope;
    fn sort(&self) -> i32;
    fn id(&self) -> i64;
    fn is_deleted(&self) -> bool;
}

impl ScopedDefinition for FieldDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn sort(&self) -> i32 {
        self.sort
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl ScopedDefinition for EnumDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn sort(&self) -> i32 {
        self.sort
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Builds the effective list of definitions for a tenant view.
///
/// Deleted rows and rows of other tenants are dropped before deduplication,
/// so a soft-deleted tenant override never hides the global row.
pub fn effective_definitions<T: ScopedDefinition>(rows: Vec<T>, tenant: Option<TenantId>) -> Vec<T> {
    let mut visible: Vec<T> = rows
        .into_iter()
        .filter(|row| !row.is_deleted() && row.scope().visible_to(tenant))
        .collect();

    // Tenant rows first so dedup keeps them.
    visible.sort_by(|a, b| {
        a.scope()
            .precedence()
            .cmp(&b.scope().precedence())
            .then_with(|| a.id().cmp(&b.id()))
    });

    let mut seen = HashSet::new();
    let mut effective: Vec<T> = visible
        .into_iter()
        .filter(|row| seen.insert(row.name().to_string()))
        .collect();

    effective.sort_by(|a, b| a.sort().cmp(&b.sort()).then_with(|| a.id().cmp(&b.id())));
    effective
}

/// The effective definition with `name`, if any.
pub fn effective_definition<T: ScopedDefinition>(
    rows: Vec<T>,
    name: &str,
    tenant: Option<TenantId>,
) -> Option<T> {
    let named: Vec<T> = rows.into_iter().filter(|row| row.name() == name).collect();
    effective_definitions(named, tenant).into_iter().next()
}

/// Effective fields that form renderers should show.
pub fn active_fields(fields: Vec<FieldDefinition>) -> Vec<FieldDefinition> {
    fields.into_iter().filter(|f| f.is_active).collect()
}

/// Options of the effective enum `name`; empty when no definition is visible.
pub fn effective_enum_options(
    rows: Vec<EnumDefinition>,
    name: &str,
    tenant: Option<TenantId>,
) -> Vec<EnumOption> {
    effective_definition(rows, name, tenant)
        .map(|def| def.options)
        .unwrap_or_default()
}

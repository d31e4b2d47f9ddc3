//! Effective setting resolution.
//!
//! Resolves the effective value of a setting key for a tenant view:
//! 1. Tenant override
//! 2. Global default record
//! 3. Compiled-in static default
//!
//! Keys declared `FieldMerge` combine the tenant override with the lower
//! layer field by field instead of replacing it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DomainError;
use crate::models::{ConfigEntry, MergePolicy, ScopeRequirement, SettingDescriptor, SettingsMap, TenantId};

/// Source of a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingSource {
    Tenant,
    Global,
    StaticDefault,
    Merged,
}

impl std::fmt::Display for SettingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tenant => write!(f, "tenant"),
            Self::Global => write!(f, "global"),
            Self::StaticDefault => write!(f, "static_default"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// An effective setting value with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolvedSetting {
    pub key: String,
    pub value: SettingsMap,
    pub source: SettingSource,
    /// Source of each top-level field.
    pub field_sources: BTreeMap<String, SettingSource>,
    /// Version of the stored record the value came from, if any. For merged
    /// values this is the tenant record's version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl ResolvedSetting {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.value.get(field)
    }

    pub fn field_source(&self, field: &str) -> Option<SettingSource> {
        self.field_sources.get(field).copied()
    }

    fn whole(key: &str, value: SettingsMap, source: SettingSource, version: Option<i64>) -> Self {
        let field_sources = value.keys().map(|k| (k.clone(), source)).collect();
        Self {
            key: key.to_string(),
            value,
            source,
            field_sources,
            version,
        }
    }
}

/// Result of resolving a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(ResolvedSetting),
    /// No tenant record, no global record and no static default.
    Unresolved { key: String },
}

impl Resolution {
    pub fn resolved(&self) -> Option<&ResolvedSetting> {
        match self {
            Resolution::Resolved(setting) => Some(setting),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn into_resolved(self) -> Option<ResolvedSetting> {
        match self {
            Resolution::Resolved(setting) => Some(setting),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Input for resolving one key.
#[derive(Debug, Clone)]
pub struct SettingResolutionInput<'a> {
    pub key: &'a str,
    /// Registry declaration; `None` for undeclared keys.
    pub descriptor: Option<&'a SettingDescriptor>,
    pub tenant_entry: Option<&'a ConfigEntry>,
    pub global_entry: Option<&'a ConfigEntry>,
}

/// Determines the tenant view a key is resolved for.
///
/// Global-only keys ignore the tenant; tenant-required keys fail without one.
pub fn resolution_view(
    key: &str,
    requirement: ScopeRequirement,
    tenant: Option<TenantId>,
) -> Result<Option<TenantId>, DomainError> {
    match (requirement, tenant) {
        (ScopeRequirement::GlobalOnly, _) => Ok(None),
        (ScopeRequirement::TenantRequired, None) => Err(DomainError::ScopeUnavailable {
            key: key.to_string(),
        }),
        (_, tenant) => Ok(tenant),
    }
}

/// Resolve the effective value of a setting.
///
/// Never fails: absence at every layer yields [`Resolution::Unresolved`].
pub fn resolve_setting(input: SettingResolutionInput<'_>) -> Resolution {
    let policy = input.descriptor.map(|d| d.policy).unwrap_or_default();
    let static_default = input.descriptor.and_then(|d| d.default.as_ref());

    // Lower layer: the global record, else the static default.
    let base = match (input.global_entry, static_default) {
        (Some(global), _) => Some((&global.value, SettingSource::Global, Some(global.version))),
        (None, Some(default)) => Some((default, SettingSource::StaticDefault, None)),
        (None, None) => None,
    };

    match (input.tenant_entry, policy, base) {
        (Some(tenant), MergePolicy::Replace, _) => Resolution::Resolved(ResolvedSetting::whole(
            input.key,
            tenant.value.clone(),
            SettingSource::Tenant,
            Some(tenant.version),
        )),
        (Some(tenant), MergePolicy::FieldMerge, Some((base_value, base_source, _))) => {
            let mut value = base_value.clone();
            let mut field_sources: BTreeMap<String, SettingSource> =
                base_value.keys().map(|k| (k.clone(), base_source)).collect();
            for (field, field_value) in &tenant.value {
                if field_value.is_null() {
                    // Null tenant fields inherit from the lower layer.
                    continue;
                }
                value.insert(field.clone(), field_value.clone());
                field_sources.insert(field.clone(), SettingSource::Tenant);
            }
            Resolution::Resolved(ResolvedSetting {
                key: input.key.to_string(),
                value,
                source: SettingSource::Merged,
                field_sources,
                version: Some(tenant.version),
            })
        }
        (Some(tenant), MergePolicy::FieldMerge, None) => {
            let value: SettingsMap = tenant
                .value
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Resolution::Resolved(ResolvedSetting::whole(
                input.key,
                value,
                SettingSource::Tenant,
                Some(tenant.version),
            ))
        }
        (None, _, Some((base_value, base_source, version))) => Resolution::Resolved(
            ResolvedSetting::whole(input.key, base_value.clone(), base_source, version),
        ),
        (None, _, None) => Resolution::Unresolved {
            key: input.key.to_string(),
        },
    }
}

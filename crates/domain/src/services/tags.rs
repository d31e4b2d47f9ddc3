//! Cache tag derivation.
//!
//! Reads tag what they depend on and writes invalidate what they touch, both
//! through [`tags_for`], so the two sides cannot drift apart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{ChangeEvent, EntityKind, Scope, TargetType, TenantId};

/// Coarse tag covering every enum list.
pub const ENUM_CATALOG_TAG: &str = "dynamic_enums";

/// An invalidation tag attached to cached results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTag(String);

impl CacheTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a cached result or a write is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSubject<'a> {
    /// A single setting key.
    Setting(&'a str),
    /// The field definition list of a target type.
    FieldDefinitions(TargetType),
    /// A single named enum.
    EnumDefinition(&'a str),
    /// The list of all enums.
    EnumCatalog,
}

/// Tags for `subject` stored in `scope`.
pub fn tags_for(scope: Scope, subject: CacheSubject<'_>) -> BTreeSet<CacheTag> {
    let mut tags = BTreeSet::new();
    match subject {
        CacheSubject::Setting(key) => {
            tags.insert(scoped_tag("setting", scope, key));
        }
        // Field lists are flushed per target type for any scope: a global
        // write affects every tenant that lacks its own override.
        CacheSubject::FieldDefinitions(target_type) => {
            tags.insert(CacheTag(format!("custom_fields:model:{}", target_type)));
        }
        CacheSubject::EnumDefinition(name) => {
            tags.insert(scoped_tag("dynamic_enum", scope, name));
        }
        CacheSubject::EnumCatalog => {
            tags.insert(CacheTag(ENUM_CATALOG_TAG.to_string()));
        }
    }
    tags
}

/// Tags for a result resolved for a tenant view: the union of the tags of
/// every scope in its lookup chain.
pub fn read_tags(tenant: Option<TenantId>, subject: CacheSubject<'_>) -> BTreeSet<CacheTag> {
    Scope::lookup_chain(tenant)
        .into_iter()
        .flat_map(|scope| tags_for(scope, subject))
        .collect()
}

/// Tags invalidated by a change event.
pub fn change_tags(event: &ChangeEvent) -> BTreeSet<CacheTag> {
    match event.entity {
        EntityKind::Setting => tags_for(event.scope, CacheSubject::Setting(&event.key)),
        EntityKind::FieldDefinition => match event.target_type {
            Some(target_type) => tags_for(event.scope, CacheSubject::FieldDefinitions(target_type)),
            // Without a target type every field list may be affected.
            None => TargetType::ALL
                .iter()
                .flat_map(|t| tags_for(event.scope, CacheSubject::FieldDefinitions(*t)))
                .collect(),
        },
        EntityKind::EnumDefinition => {
            let mut tags = tags_for(event.scope, CacheSubject::EnumDefinition(&event.key));
            tags.extend(tags_for(event.scope, CacheSubject::EnumCatalog));
            tags
        }
    }
}

/// Cache key of a result for a tenant view.
pub fn cache_key(tenant: Option<TenantId>, subject: CacheSubject<'_>) -> String {
    let view = match tenant {
        Some(id) => format!("tenant:{}", id),
        None => "global".to_string(),
    };
    match subject {
        CacheSubject::Setting(key) => format!("setting:{}@{}", key, view),
        CacheSubject::FieldDefinitions(target_type) => {
            format!("custom_fields:{}@{}", target_type, view)
        }
        CacheSubject::EnumDefinition(name) => format!("dynamic_enum:{}@{}", name, view),
        CacheSubject::EnumCatalog => format!("{}@{}", ENUM_CATALOG_TAG, view),
    }
}

fn scoped_tag(prefix: &str, scope: Scope, name: &str) -> CacheTag {
    match scope {
        Scope::Global => CacheTag(format!("{}:global:{}", prefix, name)),
        Scope::Tenant(id) => CacheTag(format!("{}:tenant:{}:{}", prefix, id, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tenant() -> TenantId {
        TenantId::new(Uuid::new_v4())
    }

    fn tag_strings(tags: &BTreeSet<CacheTag>) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_setting_read_tags_cover_tenant_and_global() {
        let t = tenant();
        let tags = read_tags(Some(t), CacheSubject::Setting("system.gdpr"));
        assert_eq!(
            tag_strings(&tags),
            vec![
                "setting:global:system.gdpr".to_string(),
                format!("setting:tenant:{}:system.gdpr", t),
            ]
        );
    }

    #[test]
    fn test_global_write_intersects_every_tenant_read() {
        let write = change_tags(&ChangeEvent::setting("system.gdpr", Scope::Global, Some(2)));
        for _ in 0..3 {
            let read = read_tags(Some(tenant()), CacheSubject::Setting("system.gdpr"));
            assert!(!write.is_disjoint(&read));
        }
    }

    #[test]
    fn test_tenant_write_only_intersects_own_reads() {
        let t1 = tenant();
        let t2 = tenant();
        let write = change_tags(&ChangeEvent::setting("system.gdpr", Scope::Tenant(t1), Some(1)));

        let own = read_tags(Some(t1), CacheSubject::Setting("system.gdpr"));
        let other = read_tags(Some(t2), CacheSubject::Setting("system.gdpr"));
        let global_view = read_tags(None, CacheSubject::Setting("system.gdpr"));
        let other_key = read_tags(Some(t1), CacheSubject::Setting("system.otp"));

        assert!(!write.is_disjoint(&own));
        assert!(write.is_disjoint(&other));
        assert!(write.is_disjoint(&global_view));
        assert!(write.is_disjoint(&other_key));
    }

    #[test]
    fn test_field_tags_are_per_target_type() {
        let tags = tags_for(Scope::Tenant(tenant()), CacheSubject::FieldDefinitions(TargetType::Student));
        assert_eq!(tag_strings(&tags), vec!["custom_fields:model:student".to_string()]);

        let write = change_tags(&ChangeEvent::field("photo", Scope::Global, TargetType::Student));
        let staff = read_tags(Some(tenant()), CacheSubject::FieldDefinitions(TargetType::Staff));
        assert!(write.is_disjoint(&staff));
    }

    #[test]
    fn test_enum_change_flushes_catalog() {
        let t = tenant();
        let write = change_tags(&ChangeEvent::enumeration("religion", Scope::Tenant(t)));
        let catalog = read_tags(Some(t), CacheSubject::EnumCatalog);
        let named = read_tags(Some(t), CacheSubject::EnumDefinition("religion"));
        assert!(!write.is_disjoint(&catalog));
        assert!(!write.is_disjoint(&named));
    }

    #[test]
    fn test_cache_keys_differ_per_view() {
        let t = tenant();
        let global = cache_key(None, CacheSubject::Setting("app.invoice"));
        let scoped = cache_key(Some(t), CacheSubject::Setting("app.invoice"));
        assert_eq!(global, "setting:app.invoice@global");
        assert_ne!(global, scoped);
    }
}

//! Fixtures shared by the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use fake::faker::lorem::en::Words;
use fake::Fake;
use uuid::Uuid;

use domain::models::{
    settings_map, Actor, EnumOption, FieldKind, NewEnumDefinition, NewFieldDefinition,
    SettingRegistry, SettingsMap, TargetType, TenantId,
};
use domain::services::InMemoryOverrideStore;
use persistence::cache::FailingCacheBackend;
use persistence::{CacheConfig, CacheLayer};
use settings_engine::{RequestContext, SettingsEngine};

pub fn engine() -> SettingsEngine {
    SettingsEngine::new(
        Arc::new(InMemoryOverrideStore::new()),
        Arc::new(SettingRegistry::builtin()),
        CacheLayer::from_config(&CacheConfig::default()),
    )
}

/// Engine whose cache backend is always down.
pub fn engine_with_failing_cache() -> SettingsEngine {
    SettingsEngine::new(
        Arc::new(InMemoryOverrideStore::new()),
        Arc::new(SettingRegistry::builtin()),
        CacheLayer::new(Arc::new(FailingCacheBackend::new())),
    )
}

pub fn new_tenant() -> TenantId {
    TenantId::new(Uuid::new_v4())
}

/// Global administrator without a tenant context.
pub fn system_ctx() -> RequestContext {
    RequestContext::system(Actor::global_admin(Uuid::new_v4()))
}

/// Administrator of `tenant` acting inside it.
pub fn tenant_admin_ctx(tenant: TenantId) -> RequestContext {
    RequestContext::for_tenant(tenant, Actor::tenant_admin(Uuid::new_v4(), tenant))
}

/// Actor with no capabilities reading inside `tenant`.
pub fn tenant_reader_ctx(tenant: TenantId) -> RequestContext {
    RequestContext::for_tenant(tenant, Actor::new(Uuid::new_v4()))
}

pub fn settings(value: serde_json::Value) -> SettingsMap {
    settings_map(value).expect("settings fixture must be a JSON object")
}

fn label() -> String {
    let words: Vec<String> = Words(1..3).fake();
    let label = words.join(" ");
    if label.is_empty() {
        "Field".to_string()
    } else {
        label
    }
}

pub fn image_field(name: &str, target_type: TargetType, max_file_size_kb: u32, sort: i32) -> NewFieldDefinition {
    NewFieldDefinition {
        name: name.to_string(),
        label: label(),
        target_type,
        kind: FieldKind::Image {
            max_file_size_kb,
            allowed_extensions: vec!["jpg".to_string(), "png".to_string()],
        },
        sort,
        required: false,
        rules: Vec::new(),
        placeholder: None,
        help_text: None,
        is_active: true,
    }
}

pub fn text_field(name: &str, target_type: TargetType, sort: i32) -> NewFieldDefinition {
    NewFieldDefinition {
        name: name.to_string(),
        label: label(),
        target_type,
        kind: FieldKind::Text {
            max_length: Some(120),
        },
        sort,
        required: false,
        rules: Vec::new(),
        placeholder: None,
        help_text: None,
        is_active: true,
    }
}

pub fn enum_definition(name: &str, values: &[&str]) -> NewEnumDefinition {
    NewEnumDefinition {
        name: name.to_string(),
        label: label(),
        applies_to: None,
        options: values
            .iter()
            .map(|v| EnumOption::new(*v, v.to_uppercase()))
            .collect(),
        sort: 0,
    }
}

//! Static setting registry: compiled-in defaults and per-key policies.
//!
//! The registry is built once at start-up (the built-in table, optionally
//! extended from a defaults file) and shared read-only behind an `Arc`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use super::config_entry::{settings_map, SettingsMap};

/// Version of the built-in defaults table.
pub const BUILTIN_REGISTRY_VERSION: &str = "2024.1";

/// How a tenant override combines with the global value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The tenant record replaces the global record wholesale.
    #[default]
    Replace,
    /// Tenant fields overwrite global fields one by one; null or absent
    /// tenant fields inherit.
    FieldMerge,
}

/// Which scopes a key may be resolved and written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeRequirement {
    /// Resolves per tenant when a tenant context exists, globally otherwise.
    #[default]
    TenantOptional,
    /// Only meaningful inside a tenant context.
    TenantRequired,
    /// System-wide only; tenant overrides are not allowed.
    GlobalOnly,
}

/// Declaration of one setting key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDescriptor {
    pub key: String,
    #[serde(default)]
    pub policy: MergePolicy,
    #[serde(default)]
    pub scope: ScopeRequirement,
    #[serde(default)]
    pub default: Option<SettingsMap>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SettingDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            policy: MergePolicy::Replace,
            scope: ScopeRequirement::TenantOptional,
            default: None,
            description: None,
        }
    }

    pub fn policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn scope(mut self, scope: ScopeRequirement) -> Self {
        self.scope = scope;
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = settings_map(value);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Immutable, versioned table of setting declarations.
#[derive(Debug, Clone)]
pub struct SettingRegistry {
    version: String,
    descriptors: HashMap<String, SettingDescriptor>,
}

impl SettingRegistry {
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            descriptors: HashMap::new(),
        }
    }

    /// Adds or replaces a descriptor. Used while building the registry.
    pub fn with_descriptor(mut self, descriptor: SettingDescriptor) -> Self {
        self.descriptors.insert(descriptor.key.clone(), descriptor);
        self
    }

    /// Extends the registry with descriptors loaded from a defaults file.
    /// Loaded descriptors replace built-in ones with the same key.
    pub fn extend(
        mut self,
        version: impl Into<String>,
        descriptors: impl IntoIterator<Item = SettingDescriptor>,
    ) -> Self {
        for descriptor in descriptors {
            self.descriptors.insert(descriptor.key.clone(), descriptor);
        }
        self.version = version.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptor(&self, key: &str) -> Option<&SettingDescriptor> {
        self.descriptors.get(key)
    }

    /// Merge policy for a key; unknown keys replace wholesale.
    pub fn policy_for(&self, key: &str) -> MergePolicy {
        self.descriptor(key).map(|d| d.policy).unwrap_or_default()
    }

    /// Scope requirement for a key; unknown keys are tenant-optional.
    pub fn scope_for(&self, key: &str) -> ScopeRequirement {
        self.descriptor(key).map(|d| d.scope).unwrap_or_default()
    }

    pub fn default_for(&self, key: &str) -> Option<&SettingsMap> {
        self.descriptor(key).and_then(|d| d.default.as_ref())
    }

    /// Descriptors sorted by key.
    pub fn descriptors(&self) -> Vec<&SettingDescriptor> {
        let mut all: Vec<_> = self.descriptors.values().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// The compiled-in defaults for the back-office settings screens.
    pub fn builtin() -> Self {
        Self::empty(BUILTIN_REGISTRY_VERSION)
            .with_descriptor(
                SettingDescriptor::new("system.gdpr")
                    .description("Cookie / GDPR consent banner")
                    .default_value(json!({
                        "enabled": false,
                        "content_text": "We use cookies to improve your experience on this site.",
                        "button_text": "Accept",
                        "position": "bottom",
                        "policy_url": null
                    })),
            )
            .with_descriptor(
                SettingDescriptor::new("system.otp")
                    .description("One-time password login")
                    .default_value(json!({
                        "enabled": false,
                        "channel": "email",
                        "length": 6,
                        "expiry_minutes": 10,
                        "max_attempts": 5
                    })),
            )
            .with_descriptor(
                SettingDescriptor::new("system.user_management")
                    .description("User registration and password policy")
                    .default_value(json!({
                        "allow_self_registration": false,
                        "require_email_verification": true,
                        "password_min_length": 8,
                        "password_requires_symbol": false,
                        "session_lifetime_minutes": 120
                    })),
            )
            .with_descriptor(
                SettingDescriptor::new("app.invoice")
                    .description("Invoice numbering and branding")
                    .policy(MergePolicy::FieldMerge)
                    .default_value(json!({
                        "prefix": "INV-",
                        "next_number": 1,
                        "number_padding": 5,
                        "logo": null,
                        "footer_text": "Thank you for your payment.",
                        "show_tax_breakdown": true
                    })),
            )
            .with_descriptor(
                SettingDescriptor::new("app.printer")
                    .description("Receipt and report printing")
                    .policy(MergePolicy::FieldMerge)
                    .default_value(json!({
                        "paper_size": "A4",
                        "orientation": "portrait",
                        "header_logo": null,
                        "header_text": null,
                        "margin_mm": 10
                    })),
            )
            .with_descriptor(
                SettingDescriptor::new("system.mail")
                    .description("Outgoing mail transport")
                    .scope(ScopeRequirement::GlobalOnly)
                    .default_value(json!({
                        "driver": "log",
                        "from_address": "noreply@example.com",
                        "from_name": "School Office"
                    })),
            )
            .with_descriptor(
                SettingDescriptor::new("school.academic_session")
                    .description("Current academic session of a school")
                    .scope(ScopeRequirement::TenantRequired),
            )
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

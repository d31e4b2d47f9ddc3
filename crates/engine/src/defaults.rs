//! Loading the static default table.
//!
//! The built-in registry can be extended at start-up with a TOML file of
//! extra declarations:
//!
//! ```toml
//! version = "2024.1-local"
//!
//! [[settings]]
//! key = "app.library"
//! policy = "field_merge"
//!
//! [settings.default]
//! max_loans = 3
//! ```

use serde::Deserialize;
use thiserror::Error;

use domain::models::{SettingDescriptor, SettingRegistry};

use crate::config::DefaultsConfig;

#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error("Failed to load defaults file: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid setting key {key:?} in defaults file: {message}")]
    InvalidKey { key: String, message: String },
}

#[derive(Debug, Deserialize)]
struct DefaultsFile {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    settings: Vec<SettingDescriptor>,
}

/// Builds the registry: the built-in table, extended from `defaults.path`
/// when one is configured.
pub fn load_registry(config: &DefaultsConfig) -> Result<SettingRegistry, DefaultsError> {
    let builtin = SettingRegistry::builtin();
    let Some(path) = &config.path else {
        return Ok(builtin);
    };

    let source = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()?;
    let registry = extend_registry(builtin, source.try_deserialize()?)?;
    tracing::info!(
        path = %path,
        version = registry.version(),
        settings = registry.len(),
        "Loaded setting defaults"
    );
    Ok(registry)
}

/// Parses declarations from TOML text and merges them over `base`.
pub fn registry_from_toml(base: SettingRegistry, toml: &str) -> Result<SettingRegistry, DefaultsError> {
    let source = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;
    extend_registry(base, source.try_deserialize()?)
}

fn extend_registry(base: SettingRegistry, file: DefaultsFile) -> Result<SettingRegistry, DefaultsError> {
    for descriptor in &file.settings {
        shared::validation::validate_setting_key(&descriptor.key).map_err(|e| {
            DefaultsError::InvalidKey {
                key: descriptor.key.clone(),
                message: e
                    .message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            }
        })?;
    }

    let version = file
        .version
        .unwrap_or_else(|| format!("{}+local", base.version()));
    Ok(base.extend(version, file.settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{MergePolicy, ScopeRequirement};

    #[test]
    fn test_no_path_returns_builtin() {
        let registry = load_registry(&DefaultsConfig::default()).unwrap();
        assert_eq!(registry.len(), SettingRegistry::builtin().len());
    }

    #[test]
    fn test_registry_from_toml_adds_and_replaces() {
        let toml = r#"
            version = "test-1"

            [[settings]]
            key = "app.library"
            policy = "field_merge"
            scope = "tenant_required"

            [settings.default]
            max_loans = 3
            loan_days = 14

            [[settings]]
            key = "system.gdpr"

            [settings.default]
            enabled = true
        "#;

        let registry = registry_from_toml(SettingRegistry::builtin(), toml).unwrap();
        assert_eq!(registry.version(), "test-1");
        assert_eq!(registry.policy_for("app.library"), MergePolicy::FieldMerge);
        assert_eq!(
            registry.scope_for("app.library"),
            ScopeRequirement::TenantRequired
        );
        assert_eq!(registry.default_for("app.library").unwrap()["max_loans"], 3);
        assert_eq!(registry.default_for("system.gdpr").unwrap()["enabled"], true);
        assert!(registry.default_for("system.gdpr").unwrap().get("position").is_none());
    }

    #[test]
    fn test_missing_version_is_derived() {
        let toml = r#"
            [[settings]]
            key = "app.transport"
        "#;
        let registry = registry_from_toml(SettingRegistry::builtin(), toml).unwrap();
        assert_eq!(registry.version(), "2024.1+local");
        assert!(registry.descriptor("app.transport").is_some());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let toml = r#"
            [[settings]]
            key = "App.Invoice"
        "#;
        let err = registry_from_toml(SettingRegistry::builtin(), toml).unwrap_err();
        assert!(matches!(err, DefaultsError::InvalidKey { .. }));
    }

    #[test]
    fn test_missing_file_fails() {
        let config = DefaultsConfig {
            path: Some("does/not/exist".to_string()),
            seed_on_start: false,
        };
        assert!(matches!(load_registry(&config), Err(DefaultsError::Load(_))));
    }
}

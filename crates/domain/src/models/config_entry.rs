//! Keyed setting records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::change_event::ChangeEvent;
use super::scope::Scope;

/// Structured payload of a setting: field name to value.
pub type SettingsMap = serde_json::Map<String, serde_json::Value>;

/// A stored setting value for one `(key, scope)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigEntry {
    pub id: Uuid,
    pub key: String,
    pub scope: Scope,
    pub value: SettingsMap,
    /// Starts at 1 and increments on every write to the same `(key, scope)`.
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted record together with the change it produced.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub record: T,
    pub change: ChangeEvent,
}

impl<T> Committed<T> {
    pub fn new(record: T, change: ChangeEvent) -> Self {
        Self { record, change }
    }
}

/// Converts a JSON value into a settings map, rejecting non-objects.
pub fn settings_map(value: serde_json::Value) -> Option<SettingsMap> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_map_accepts_objects_only() {
        assert!(settings_map(json!({"position": "bottom"})).is_some());
        assert!(settings_map(json!(["bottom"])).is_none());
        assert!(settings_map(json!("bottom")).is_none());
        assert!(settings_map(json!(null)).is_none());
    }

    #[test]
    fn test_config_entry_serialization() {
        let entry = ConfigEntry {
            id: Uuid::nil(),
            key: "system.gdpr".to_string(),
            scope: Scope::Global,
            value: settings_map(json!({"content_text": "Default text"})).unwrap(),
            version: 1,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""key":"system.gdpr""#));
        assert!(json.contains(r#""version":1"#));
        assert!(!json.contains("updated_by"));
    }
}

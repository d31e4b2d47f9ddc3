//! Repository implementations for database operations.

pub mod config_override;
pub mod enum_definition;
pub mod field_definition;

pub use config_override::ConfigOverrideRepository;
pub use enum_definition::EnumDefinitionRepository;
pub use field_definition::FieldDefinitionRepository;

use domain::models::Scope;
use uuid::Uuid;

/// Bind parameters selecting rows in any of a set of scopes.
///
/// Used as `(tenant_id IS NULL AND $n) OR tenant_id = ANY($m)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    pub include_global: bool,
    pub tenant_ids: Vec<Uuid>,
}

impl ScopeFilter {
    pub fn new(scopes: &[Scope]) -> Self {
        let mut filter = Self::default();
        for scope in scopes {
            match scope.tenant_column() {
                None => filter.include_global = true,
                Some(id) => filter.tenant_ids.push(id),
            }
        }
        filter
    }
}

//! Configuration scope: global defaults versus tenant overrides.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a tenant (a school).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scope a configuration record belongs to.
///
/// `Global` records are system defaults shared by every tenant; `Tenant`
/// records override them for a single tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tenant_id", rename_all = "snake_case")]
pub enum Scope {
    Global,
    Tenant(TenantId),
}

impl Scope {
    /// Returns the owning tenant, if any.
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Scope::Global => None,
            Scope::Tenant(id) => Some(*id),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }

    /// Scope for a write made in the given tenant context.
    pub fn for_context(tenant: Option<TenantId>) -> Self {
        match tenant {
            Some(id) => Scope::Tenant(id),
            None => Scope::Global,
        }
    }

    /// Scopes consulted when resolving for a tenant view, most specific first.
    pub fn lookup_chain(tenant: Option<TenantId>) -> Vec<Scope> {
        match tenant {
            Some(id) => vec![Scope::Tenant(id), Scope::Global],
            None => vec![Scope::Global],
        }
    }

    /// Precedence rank; lower wins.
    pub fn precedence(&self) -> u8 {
        match self {
            Scope::Tenant(_) => 0,
            Scope::Global => 1,
        }
    }

    /// Whether a record in this scope is visible to the given tenant view.
    pub fn visible_to(&self, tenant: Option<TenantId>) -> bool {
        match self {
            Scope::Global => true,
            Scope::Tenant(id) => tenant == Some(*id),
        }
    }

    /// Maps a nullable tenant column into a scope.
    pub fn from_tenant_column(tenant_id: Option<Uuid>) -> Self {
        match tenant_id {
            Some(id) => Scope::Tenant(TenantId(id)),
            None => Scope::Global,
        }
    }

    /// Maps a scope into the nullable tenant column used by storage.
    pub fn tenant_column(&self) -> Option<Uuid> {
        self.tenant_id().map(|id| id.as_uuid())
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Tenant(id) => write!(f, "tenant:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_display() {
        let id = Uuid::nil();
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(
            Scope::Tenant(TenantId::new(id)).to_string(),
            "tenant:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_lookup_chain() {
        let tenant = TenantId::new(Uuid::new_v4());
        assert_eq!(Scope::lookup_chain(None), vec![Scope::Global]);
        assert_eq!(
            Scope::lookup_chain(Some(tenant)),
            vec![Scope::Tenant(tenant), Scope::Global]
        );
    }

    #[test]
    fn test_visibility() {
        let t1 = TenantId::new(Uuid::new_v4());
        let t2 = TenantId::new(Uuid::new_v4());
        assert!(Scope::Global.visible_to(None));
        assert!(Scope::Global.visible_to(Some(t1)));
        assert!(Scope::Tenant(t1).visible_to(Some(t1)));
        assert!(!Scope::Tenant(t1).visible_to(Some(t2)));
        assert!(!Scope::Tenant(t1).visible_to(None));
    }

    #[test]
    fn test_tenant_column_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(Scope::from_tenant_column(None), Scope::Global);
        assert_eq!(Scope::from_tenant_column(Some(id)).tenant_column(), Some(id));
        assert_eq!(Scope::Global.tenant_column(), None);
    }

    #[test]
    fn test_precedence_prefers_tenant() {
        let tenant = Scope::Tenant(TenantId::new(Uuid::new_v4()));
        assert!(tenant.precedence() < Scope::Global.precedence());
    }

    #[test]
    fn test_scope_serialization() {
        let json = serde_json::to_string(&Scope::Global).unwrap();
        assert_eq!(json, r#"{"kind":"global"}"#);

        let tenant = Scope::Tenant(TenantId::new(Uuid::nil()));
        let json = serde_json::to_string(&tenant).unwrap();
        assert!(json.contains(r#""kind":"tenant""#));
        let back: Scope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tenant);
    }
}

//! Authenticated actor and write capabilities.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::scope::TenantId;

/// A capability relevant to configuration writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tenant_id", rename_all = "snake_case")]
pub enum Capability {
    /// May manage global records and act on behalf of any tenant.
    GlobalAdmin,
    /// May manage records owned by one tenant.
    TenantAdmin(TenantId),
}

/// The authenticated actor performing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub capabilities: HashSet<Capability>,
}

impl Actor {
    /// Creates an actor without capabilities.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            capabilities: HashSet::new(),
        }
    }

    /// Creates a global administrator.
    pub fn global_admin(id: Uuid) -> Self {
        Self::new(id).with_capability(Capability::GlobalAdmin)
    }

    /// Creates an administrator of a single tenant.
    pub fn tenant_admin(id: Uuid, tenant: TenantId) -> Self {
        Self::new(id).with_capability(Capability::TenantAdmin(tenant))
    }

    /// The internal actor used by bootstrap and seeding.
    pub fn system() -> Self {
        Self::global_admin(Uuid::nil())
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn is_global_admin(&self) -> bool {
        self.capabilities.contains(&Capability::GlobalAdmin)
    }

    /// Check if the actor may manage records owned by the given tenant.
    pub fn can_manage_tenant(&self, tenant: TenantId) -> bool {
        self.is_global_admin()
            || self
                .capabilities
                .contains(&Capability::TenantAdmin(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_admin_manages_any_tenant() {
        let actor = Actor::global_admin(Uuid::new_v4());
        assert!(actor.is_global_admin());
        assert!(actor.can_manage_tenant(TenantId::new(Uuid::new_v4())));
    }

    #[test]
    fn test_tenant_admin_scoped_to_own_tenant() {
        let own = TenantId::new(Uuid::new_v4());
        let other = TenantId::new(Uuid::new_v4());
        let actor = Actor::tenant_admin(Uuid::new_v4(), own);
        assert!(!actor.is_global_admin());
        assert!(actor.can_manage_tenant(own));
        assert!(!actor.can_manage_tenant(other));
    }

    #[test]
    fn test_actor_without_capabilities() {
        let actor = Actor::new(Uuid::new_v4());
        assert!(!actor.is_global_admin());
        assert!(!actor.can_manage_tenant(TenantId::new(Uuid::new_v4())));
    }

    #[test]
    fn test_system_actor() {
        let actor = Actor::system();
        assert_eq!(actor.id, Uuid::nil());
        assert!(actor.is_global_admin());
    }
}

//! Per-call tenant and actor context.

use domain::models::{Actor, Scope, TenantId};

/// Who is calling and on behalf of which tenant.
///
/// Built by the caller's request pipeline. A context without a tenant is a
/// system-level view: reads resolve against global records only.
#[derive(Debug, Clone)]
pub struct RequestContext {
    tenant: Option<TenantId>,
    actor: Actor,
}

impl RequestContext {
    pub fn new(tenant: Option<TenantId>, actor: Actor) -> Self {
        Self { tenant, actor }
    }

    pub fn for_tenant(tenant: TenantId, actor: Actor) -> Self {
        Self::new(Some(tenant), actor)
    }

    pub fn system(actor: Actor) -> Self {
        Self::new(None, actor)
    }

    pub fn current_tenant(&self) -> Option<TenantId> {
        self.tenant
    }

    pub fn current_actor(&self) -> &Actor {
        &self.actor
    }

    /// Scope that writes land in when the caller names none.
    pub fn write_scope(&self) -> Scope {
        Scope::for_context(self.tenant)
    }
}

//! Write authorization for scoped configuration records.
//!
//! Global records may only be written or deleted by global administrators;
//! tenant records by administrators of that tenant (or a global
//! administrator acting on its behalf). A successful check yields a
//! [`WritePermit`], the only way to reach a store mutation.

use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{Actor, Scope, TenantId};

/// Why a write was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "tenant_id", rename_all = "snake_case")]
pub enum DenialReason {
    GlobalRecordsRestricted,
    GlobalDeletionForbidden,
    ForeignTenant(TenantId),
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::GlobalRecordsRestricted => write!(f, "global records restricted"),
            DenialReason::GlobalDeletionForbidden => {
                write!(f, "global records cannot be deleted by tenant actors")
            }
            DenialReason::ForeignTenant(id) => {
                write!(f, "records of another tenant ({}) cannot be modified", id)
            }
        }
    }
}

/// Proof that an actor may mutate one scope.
///
/// Only this module can construct a permit; stores write exclusively to
/// `permit.scope()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePermit {
    actor_id: Uuid,
    scope: Scope,
}

impl WritePermit {
    fn new(actor_id: Uuid, scope: Scope) -> Self {
        Self { actor_id, scope }
    }

    pub fn actor_id(&self) -> Uuid {
        self.actor_id
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteDecision {
    Allowed(WritePermit),
    Denied(DenialReason),
}

impl WriteDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, WriteDecision::Allowed(_))
    }

    /// Converts the decision into a permit or a `ScopeViolation`.
    pub fn into_permit(self) -> Result<WritePermit, DomainError> {
        match self {
            WriteDecision::Allowed(permit) => Ok(permit),
            WriteDecision::Denied(reason) => Err(DomainError::ScopeViolation(reason)),
        }
    }
}

/// Checks whether `actor` may create or update records in `scope`.
pub fn authorize_write(actor: &Actor, scope: Scope) -> WriteDecision {
    decide(actor, scope, DenialReason::GlobalRecordsRestricted)
}

/// Checks whether `actor` may delete records in `scope`.
pub fn authorize_delete(actor: &Actor, scope: Scope) -> WriteDecision {
    decide(actor, scope, DenialReason::GlobalDeletionForbidden)
}

fn decide(actor: &Actor, scope: Scope, global_denial: DenialReason) -> WriteDecision {
    match scope {
        Scope::Global if actor.is_global_admin() => {
            WriteDecision::Allowed(WritePermit::new(actor.id, scope))
        }
        Scope::Global => WriteDecision::Denied(global_denial),
        Scope::Tenant(tenant) if actor.can_manage_tenant(tenant) => {
            WriteDecision::Allowed(WritePermit::new(actor.id, scope))
        }
        Scope::Tenant(tenant) => WriteDecision::Denied(DenialReason::ForeignTenant(tenant)),
    }
}

//! Errors surfaced by the settings engine to its callers.

use domain::services::DenialReason;
use domain::{DomainError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Scope violation: {0}")]
    ScopeViolation(DenialReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Scope unavailable: {key} requires a tenant context")]
    ScopeUnavailable { key: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// HTTP status a controller should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::ScopeViolation(_) => 403,
            EngineError::NotFound(_) => 404,
            EngineError::WriteConflict(_) => 409,
            EngineError::ScopeUnavailable { .. } | EngineError::Validation(_) => 400,
            EngineError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::ScopeViolation(_) => "scope_violation",
            EngineError::NotFound(_) => "not_found",
            EngineError::WriteConflict(_) => "write_conflict",
            EngineError::ScopeUnavailable { .. } => "scope_unavailable",
            EngineError::Validation(_) => "validation_error",
            EngineError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => EngineError::NotFound(msg),
            StoreError::Conflict(msg) => EngineError::WriteConflict(msg),
            StoreError::Backend(msg) => {
                tracing::error!("Store backend error: {}", msg);
                EngineError::Internal(msg)
            }
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ScopeViolation(reason) => EngineError::ScopeViolation(reason),
            DomainError::ScopeUnavailable { key } => EngineError::ScopeUnavailable { key },
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::Store(store) => store.into(),
        }
    }
}

impl From<validator::ValidationError> for EngineError {
    fn from(err: validator::ValidationError) -> Self {
        DomainError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::TenantId;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            EngineError::ScopeViolation(DenialReason::GlobalRecordsRestricted).status_code(),
            403
        );
        assert_eq!(EngineError::NotFound("x".into()).status_code(), 404);
        assert_eq!(EngineError::WriteConflict("x".into()).status_code(), 409);
        assert_eq!(
            EngineError::ScopeUnavailable { key: "x".into() }.status_code(),
            400
        );
        assert_eq!(EngineError::Validation("x".into()).status_code(), 400);
        assert_eq!(EngineError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_engine_error_display() {
        assert_eq!(
            EngineError::ScopeViolation(DenialReason::GlobalRecordsRestricted).to_string(),
            "Scope violation: global records restricted"
        );
        assert_eq!(
            EngineError::NotFound("setting app.invoice".into()).to_string(),
            "Not found: setting app.invoice"
        );
        assert_eq!(
            EngineError::ScopeUnavailable {
                key: "school.academic_session".into()
            }
            .to_string(),
            "Scope unavailable: school.academic_session requires a tenant context"
        );
    }

    #[test]
    fn test_from_store_error() {
        let err: EngineError = StoreError::Conflict("duplicate".into()).into();
        assert!(matches!(err, EngineError::WriteConflict(_)));
        assert_eq!(err.error_code(), "write_conflict");

        let err: EngineError = StoreError::NotFound("field 7".into()).into();
        assert!(matches!(err, EngineError::NotFound(_)));

        let err: EngineError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, EngineError::Internal(_)));
    }

    #[test]
    fn test_from_domain_error() {
        let tenant = TenantId::new(Uuid::new_v4());
        let err: EngineError =
            DomainError::ScopeViolation(DenialReason::ForeignTenant(tenant)).into();
        assert!(matches!(
            err,
            EngineError::ScopeViolation(DenialReason::ForeignTenant(t)) if t == tenant
        ));

        let err: EngineError = DomainError::Store(StoreError::NotFound("x".into())).into();
        assert!(matches!(err, EngineError::NotFound(_)));

        let err: EngineError = DomainError::ScopeUnavailable { key: "k".into() }.into();
        assert_eq!(err.status_code(), 400);
    }
}

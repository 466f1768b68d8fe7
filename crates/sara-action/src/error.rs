//! Error types for the command pipeline.

use crate::types::{ActionKind, PlanStatus};
use sara_core::error::SaraError;

/// Errors from capability handlers.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0}")]
    CapabilityFailed(String),
    #[error("Action kind not registered: {0}")]
    UnregisteredHandler(ActionKind),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Not supported on this platform: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        ActionError::CapabilityFailed(err.to_string())
    }
}

/// Errors from loading or persisting the audit trail.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Audit I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AuditError> for SaraError {
    fn from(err: AuditError) -> Self {
        SaraError::Audit(err.to_string())
    }
}

/// Errors from plan lifecycle management.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(PlanStatus, PlanStatus),
}

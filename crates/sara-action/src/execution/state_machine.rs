//! Plan lifecycle state machine with validated transitions.
//!
//! Pending -> Running -> Succeeded/Failed
//! Pending -> Cancelled

use uuid::Uuid;

use crate::error::PlanError;
use crate::types::PlanStatus;

/// Validate that a status transition is allowed.
///
/// Valid transitions:
/// - Pending -> Running
/// - Pending -> Cancelled (confirmation refused or timed out)
/// - Running -> Succeeded
/// - Running -> Failed
pub fn validate_transition(from: PlanStatus, to: PlanStatus) -> Result<(), PlanError> {
    let valid = matches!(
        (from, to),
        (PlanStatus::Pending, PlanStatus::Running)
            | (PlanStatus::Pending, PlanStatus::Cancelled)
            | (PlanStatus::Running, PlanStatus::Succeeded)
            | (PlanStatus::Running, PlanStatus::Failed)
    );

    if valid {
        Ok(())
    } else {
        Err(PlanError::InvalidTransition(from, to))
    }
}

/// Tracks one plan through its lifecycle.
#[derive(Debug, Clone)]
pub struct PlanRun {
    plan_id: Uuid,
    status: PlanStatus,
}

impl PlanRun {
    pub fn new(plan_id: Uuid) -> Self {
        Self {
            plan_id,
            status: PlanStatus::Pending,
        }
    }

    pub fn plan_id(&self) -> Uuid {
        self.plan_id
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }

    /// Move to `to`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&mut self, to: PlanStatus) -> Result<(), PlanError> {
        validate_transition(self.status, to)?;
        tracing::debug!(plan_id = %self.plan_id, from = %self.status, to = %to, "Plan transition");
        self.status = to;
        Ok(())
    }
}

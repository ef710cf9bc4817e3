//! Workflow error taxonomy.
//!
//! Every variant is recoverable by the caller correcting input or workflow
//! state; none is fatal to the process. Messages name the specific missing
//! requirement so the UI can point at the exact remaining step.

use redress_audit::AuditError;
use redress_policy::RequirementViolation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed or missing payload fields (rationale too short, reject
    /// note too short, override fields too short).
    #[error("{0}")]
    Validation(String),

    /// The action is not legal from the flag's current status.
    #[error("{0}")]
    InvalidState(String),

    /// Strategy-specific evidence or metadata is missing.
    #[error("{0}")]
    EvidenceRequirement(String),

    /// Required action items are not completed at submission.
    #[error("{0}")]
    IncompleteTasks(String),

    /// Flag or task does not exist in the caller's workspace.
    #[error("{0}")]
    NotFound(String),

    /// Caller lacks the privileged reviewer role.
    #[error("{0}")]
    Forbidden(String),

    #[error("audit emission failed: {0}")]
    Audit(#[from] AuditError),

    #[error("workflow store lock poisoned")]
    Lock,
}

impl From<RequirementViolation> for WorkflowError {
    fn from(violation: RequirementViolation) -> Self {
        match violation {
            RequirementViolation::MissingFields(message) => WorkflowError::Validation(message),
            RequirementViolation::MissingEvidence(message) => {
                WorkflowError::EvidenceRequirement(message)
            }
        }
    }
}

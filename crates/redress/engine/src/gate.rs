//! Verification gate: role-restricted human decision recording.
//!
//! Stateless. Every decision becomes a permanent Verification row even
//! though only the latest one determines the flag's current status.

use crate::WorkflowError;
use redress_types::{Actor, ResolutionId, Verification, VerificationDecision};

#[derive(Clone, Copy, Debug, Default)]
pub struct VerificationGate;

impl VerificationGate {
    pub fn new() -> Self {
        Self
    }

    /// Only the privileged reviewer role may pass the gate.
    pub fn authorize(&self, actor: &Actor, denial: &str) -> Result<(), WorkflowError> {
        if actor.role.is_privileged_reviewer() {
            Ok(())
        } else {
            Err(WorkflowError::Forbidden(denial.to_string()))
        }
    }

    /// Record a decision as a fresh row; history is never rewritten.
    pub fn decide(
        &self,
        resolution_id: ResolutionId,
        reviewer: &Actor,
        decision: VerificationDecision,
        note: Option<String>,
    ) -> Verification {
        Verification::new(resolution_id, reviewer.user_id.clone(), decision, note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redress_types::{UserId, UserRole, WorkspaceId};

    fn actor(role: UserRole) -> Actor {
        Actor::new(UserId::new("u1"), WorkspaceId::new("ws"), role)
    }

    #[test]
    fn members_are_turned_away() {
        let gate = VerificationGate::new();
        let err = gate
            .authorize(&actor(UserRole::Member), "Only CCO can approve remediation")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));

        gate.authorize(&actor(UserRole::OwnerCco), "Only CCO can approve remediation")
            .unwrap();
    }

    #[test]
    fn each_decision_is_a_distinct_row() {
        let gate = VerificationGate::new();
        let resolution_id = ResolutionId::generate();
        let reviewer = actor(UserRole::OwnerCco);

        let first = gate.decide(
            resolution_id.clone(),
            &reviewer,
            VerificationDecision::Rejected,
            Some("please redo section 2".to_string()),
        );
        let second = gate.decide(
            resolution_id,
            &reviewer,
            VerificationDecision::Approved,
            None,
        );
        assert_ne!(first.id, second.id);
        assert_eq!(first.decision, VerificationDecision::Rejected);
        assert_eq!(second.decision, VerificationDecision::Approved);
    }
}

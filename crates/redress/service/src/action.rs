//! Wire-level action payloads.
//!
//! One tagged union covers every remediation action, discriminated by the
//! `action` field. Strategy fields for `START_REMEDIATION` flatten into the
//! same object, discriminated by `resolutionType`, so a start payload reads
//! as one flat JSON object.

use chrono::{DateTime, Utc};
use redress_types::{EvidenceInput, StartStrategy, TaskId};
use serde::{Deserialize, Serialize};

/// A caller-submitted workflow action against one flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationAction {
    #[serde(rename_all = "camelCase")]
    StartRemediation {
        #[serde(flatten)]
        strategy: StartStrategy,
        rationale: String,
        due_date: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        evidence: Vec<EvidenceInput>,
    },
    AddEvidence {
        evidence: EvidenceInput,
    },
    #[serde(rename_all = "camelCase")]
    CompleteTask {
        task_id: TaskId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_note: Option<String>,
    },
    SubmitForVerification,
    Approve {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    Reject {
        note: String,
    },
    Override {
        reason: String,
        category: String,
    },
}

impl RemediationAction {
    /// The wire name of the action, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RemediationAction::StartRemediation { .. } => "START_REMEDIATION",
            RemediationAction::AddEvidence { .. } => "ADD_EVIDENCE",
            RemediationAction::CompleteTask { .. } => "COMPLETE_TASK",
            RemediationAction::SubmitForVerification => "SUBMIT_FOR_VERIFICATION",
            RemediationAction::Approve { .. } => "APPROVE",
            RemediationAction::Reject { .. } => "REJECT",
            RemediationAction::Override { .. } => "OVERRIDE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redress_types::{AcknowledgementStatus, ResolutionType};

    #[test]
    fn start_payload_is_one_flat_object() {
        let json = r#"{
            "action": "START_REMEDIATION",
            "resolutionType": "DISCLOSED_ELSEWHERE",
            "sourceType": "ADV Part 2",
            "disclosureDate": "2026-03-01T00:00:00Z",
            "acknowledgementStatus": "UNKNOWN",
            "rationale": "the risk was disclosed in the client's ADV delivery last quarter",
            "dueDate": "2026-03-10T00:00:00Z",
            "evidence": [{"type": "DOCUMENT_LINK", "url": "https://vault/adv.pdf"}]
        }"#;
        let action: RemediationAction = serde_json::from_str(json).unwrap();
        match action {
            RemediationAction::StartRemediation {
                strategy, evidence, ..
            } => {
                assert_eq!(
                    strategy.resolution_type(),
                    ResolutionType::DisclosedElsewhere
                );
                match strategy {
                    StartStrategy::DisclosedElsewhere {
                        acknowledgement_status,
                        ..
                    } => assert_eq!(acknowledgement_status, AcknowledgementStatus::Unknown),
                    other => panic!("unexpected strategy: {other:?}"),
                }
                assert_eq!(evidence.len(), 1);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn evidence_defaults_to_empty_on_start() {
        let json = r#"{
            "action": "START_REMEDIATION",
            "resolutionType": "FOLLOW_UP_REQUIRED",
            "followUpMethod": "email",
            "planNote": "send written disclosure covering the concentration concern raised",
            "rationale": "advisor will follow up in writing with the omitted risk language",
            "dueDate": "2026-03-10T00:00:00Z"
        }"#;
        let action: RemediationAction = serde_json::from_str(json).unwrap();
        match action {
            RemediationAction::StartRemediation { evidence, .. } => assert!(evidence.is_empty()),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn bare_actions_parse_without_extra_fields() {
        let action: RemediationAction =
            serde_json::from_str(r#"{"action": "SUBMIT_FOR_VERIFICATION"}"#).unwrap();
        assert_eq!(action.kind(), "SUBMIT_FOR_VERIFICATION");

        let action: RemediationAction =
            serde_json::from_str(r#"{"action": "APPROVE"}"#).unwrap();
        assert_eq!(action.kind(), "APPROVE");
    }

    #[test]
    fn unknown_actions_are_rejected() {
        assert!(serde_json::from_str::<RemediationAction>(r#"{"action": "RESOLVE"}"#).is_err());
    }

    #[test]
    fn complete_task_uses_camel_case_keys() {
        let json = r#"{
            "action": "COMPLETE_TASK",
            "taskId": "t-1",
            "completionNote": "confirmed against ADV"
        }"#;
        let action: RemediationAction = serde_json::from_str(json).unwrap();
        match action {
            RemediationAction::CompleteTask {
                task_id,
                completion_note,
            } => {
                assert_eq!(task_id.to_string(), "t-1");
                assert_eq!(completion_note.as_deref(), Some("confirmed against ADV"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}

//! Redress Policy - what a remediation needs before it may advance
//!
//! Pure decision logic, evaluated twice per remediation: once when it
//! starts (can this strategy begin with these fields and this evidence?)
//! and once at submission (has enough evidence accumulated since?). The
//! policy never touches storage; the workflow engine hands it everything
//! it needs and applies the result atomically.

#![deny(unsafe_code)]

use chrono::{DateTime, Duration, Utc};
use redress_types::{
    EvidenceInput, EvidenceType, ResolutionMetadata, ResolutionType, Severity, StartStrategy,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plan notes double as the written remediation plan of record, so they
/// carry the same minimum length as the rationale.
pub const MIN_PLAN_NOTE_LEN: usize = 50;

/// Acknowledgement tasks get a grace week beyond the primary due date.
const ACKNOWLEDGEMENT_GRACE: i64 = 7;

/// A requirement the caller has not met. The message names the exact
/// missing item so the caller can be guided to the remaining step.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RequirementViolation {
    /// Strategy fields are malformed or missing.
    #[error("{0}")]
    MissingFields(String),
    /// Required evidence is absent.
    #[error("{0}")]
    MissingEvidence(String),
}

/// A task the engine must create when remediation starts. Ids and the
/// owner are assigned by the engine; the policy only decides what work
/// exists and when it is due.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskBlueprint {
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub required: bool,
}

impl TaskBlueprint {
    fn required(title: &str, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            due_date,
            required: true,
        }
    }
}

/// The acknowledgement fallback rule: an explicit caller choice always
/// wins; absent one, critical flags require acknowledgement and warn
/// flags do not.
pub fn resolve_acknowledgement_requirement(explicit: Option<bool>, severity: Severity) -> bool {
    explicit.unwrap_or_else(|| severity.is_critical())
}

/// Check the start-time requirements for a strategy.
///
/// `AddContext` needs a transcript snippet anchored to a numeric offset;
/// `DisclosedElsewhere` needs its disclosure fields (enforced by the
/// variant shape) plus a linked document; `FollowUpRequired` needs a
/// method and a substantial plan note but no evidence yet.
pub fn check_start(
    strategy: &StartStrategy,
    evidence: &[EvidenceInput],
) -> Result<(), RequirementViolation> {
    match strategy {
        StartStrategy::AddContext => {
            if !evidence
                .iter()
                .any(EvidenceInput::is_anchored_transcript_snippet)
            {
                return Err(RequirementViolation::MissingEvidence(
                    "Transcript evidence is required for Add context.".to_string(),
                ));
            }
        }
        StartStrategy::DisclosedElsewhere { source_type, .. } => {
            if source_type.trim().is_empty() {
                return Err(RequirementViolation::MissingFields(
                    "Source type, disclosure date, and acknowledgement status are required."
                        .to_string(),
                ));
            }
            if !evidence.iter().any(EvidenceInput::is_linked_document) {
                return Err(RequirementViolation::MissingEvidence(
                    "Disclosure evidence link is required.".to_string(),
                ));
            }
        }
        StartStrategy::FollowUpRequired {
            follow_up_method,
            plan_note,
            ..
        } => {
            if follow_up_method.trim().is_empty() || plan_note.trim().is_empty() {
                return Err(RequirementViolation::MissingFields(
                    "Follow-up method and plan note are required.".to_string(),
                ));
            }
            if plan_note.trim().chars().count() < MIN_PLAN_NOTE_LEN {
                return Err(RequirementViolation::MissingFields(format!(
                    "Plan note must be at least {MIN_PLAN_NOTE_LEN} characters."
                )));
            }
        }
    }
    Ok(())
}

/// The batch of tasks a strategy opens with.
pub fn task_batch(
    strategy: &StartStrategy,
    severity: Severity,
    due_date: DateTime<Utc>,
) -> Vec<TaskBlueprint> {
    let ack_due = due_date + Duration::days(ACKNOWLEDGEMENT_GRACE);
    match strategy {
        StartStrategy::AddContext => vec![TaskBlueprint::required(
            "Add compliance context + link transcript evidence",
            due_date,
        )],
        StartStrategy::DisclosedElsewhere {
            acknowledgement_status,
            ..
        } => {
            let mut tasks = vec![TaskBlueprint::required(
                "Validate disclosure evidence",
                due_date,
            )];
            if *acknowledgement_status != redress_types::AcknowledgementStatus::Yes {
                tasks.push(TaskBlueprint::required(
                    "Obtain client acknowledgement",
                    ack_due,
                ));
            }
            tasks
        }
        StartStrategy::FollowUpRequired {
            require_acknowledgement,
            ..
        } => {
            let mut tasks = vec![TaskBlueprint::required(
                "Send disclosure follow-up",
                due_date,
            )];
            if resolve_acknowledgement_requirement(*require_acknowledgement, severity) {
                tasks.push(TaskBlueprint::required("Collect acknowledgement", ack_due));
            }
            tasks
        }
    }
}

/// Check the submission-time evidence requirements against everything
/// accumulated so far on the resolution record.
pub fn check_submission(
    resolution_type: ResolutionType,
    metadata: &ResolutionMetadata,
    severity: Severity,
    accumulated: &[EvidenceType],
) -> Result<(), RequirementViolation> {
    let has = |wanted: EvidenceType| accumulated.iter().any(|t| *t == wanted);

    match resolution_type {
        ResolutionType::AddContext => {
            if !has(EvidenceType::TranscriptSnippet) {
                return Err(RequirementViolation::MissingEvidence(
                    "Transcript evidence is required before submission.".to_string(),
                ));
            }
        }
        ResolutionType::DisclosedElsewhere => {
            if !has(EvidenceType::DocumentLink) {
                return Err(RequirementViolation::MissingEvidence(
                    "Disclosure evidence is required before submission.".to_string(),
                ));
            }
        }
        ResolutionType::FollowUpRequired => {
            if !has(EvidenceType::OutreachProof) {
                return Err(RequirementViolation::MissingEvidence(
                    "Outreach evidence is required before submission.".to_string(),
                ));
            }
            let require_ack = resolve_acknowledgement_requirement(
                metadata.explicit_acknowledgement_requirement(),
                severity,
            );
            if require_ack && !has(EvidenceType::Acknowledgement) {
                return Err(RequirementViolation::MissingEvidence(
                    "Acknowledgement evidence is required before submission.".to_string(),
                ));
            }
        }
        // Overrides never pass through submission; the override action
        // closes the flag directly.
        ResolutionType::OverrideApproved => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use redress_types::{AcknowledgementStatus, EvidenceDetail};

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()
    }

    fn anchored_snippet() -> EvidenceInput {
        EvidenceInput::new(EvidenceType::TranscriptSnippet).with_detail(
            EvidenceDetail::TranscriptSnippet {
                start_time: 120.0,
                snippet: None,
            },
        )
    }

    fn disclosure_strategy(ack: AcknowledgementStatus) -> StartStrategy {
        StartStrategy::DisclosedElsewhere {
            source_type: "ADV Part 2".to_string(),
            disclosure_date: due(),
            acknowledgement_status: ack,
        }
    }

    fn follow_up_strategy(require_ack: Option<bool>) -> StartStrategy {
        StartStrategy::FollowUpRequired {
            follow_up_method: "email".to_string(),
            plan_note: "send a written disclosure covering the concentration risk raised in the meeting".to_string(),
            require_acknowledgement: require_ack,
        }
    }

    #[test]
    fn acknowledgement_fallback_follows_severity() {
        assert!(resolve_acknowledgement_requirement(None, Severity::Critical));
        assert!(!resolve_acknowledgement_requirement(None, Severity::Warn));
        assert!(resolve_acknowledgement_requirement(Some(true), Severity::Warn));
        assert!(!resolve_acknowledgement_requirement(
            Some(false),
            Severity::Critical
        ));
    }

    #[test]
    fn add_context_needs_an_anchored_snippet_to_start() {
        let err = check_start(&StartStrategy::AddContext, &[]).unwrap_err();
        assert!(matches!(err, RequirementViolation::MissingEvidence(_)));
        assert!(err.to_string().contains("Transcript evidence"));

        check_start(&StartStrategy::AddContext, &[anchored_snippet()]).unwrap();
    }

    #[test]
    fn unanchored_snippet_does_not_satisfy_add_context() {
        let unanchored = EvidenceInput::new(EvidenceType::TranscriptSnippet);
        let err = check_start(&StartStrategy::AddContext, &[unanchored]).unwrap_err();
        assert!(matches!(err, RequirementViolation::MissingEvidence(_)));
    }

    #[test]
    fn disclosure_needs_a_document_link_to_start() {
        let strategy = disclosure_strategy(AcknowledgementStatus::Yes);
        let err = check_start(&strategy, &[]).unwrap_err();
        assert!(err.to_string().contains("Disclosure evidence link"));

        let link = EvidenceInput::new(EvidenceType::DocumentLink).with_url("https://vault/adv.pdf");
        check_start(&strategy, &[link]).unwrap();
    }

    #[test]
    fn blank_disclosure_source_is_a_field_violation() {
        let strategy = StartStrategy::DisclosedElsewhere {
            source_type: "  ".to_string(),
            disclosure_date: due(),
            acknowledgement_status: AcknowledgementStatus::Yes,
        };
        let err = check_start(&strategy, &[]).unwrap_err();
        assert!(matches!(err, RequirementViolation::MissingFields(_)));
    }

    #[test]
    fn follow_up_starts_without_evidence_but_needs_a_real_plan() {
        check_start(&follow_up_strategy(None), &[]).unwrap();

        let thin_plan = StartStrategy::FollowUpRequired {
            follow_up_method: "email".to_string(),
            plan_note: "send it".to_string(),
            require_acknowledgement: None,
        };
        let err = check_start(&thin_plan, &[]).unwrap_err();
        assert!(err.to_string().contains("at least 50 characters"));
    }

    #[test]
    fn plan_note_length_counts_characters_not_bytes() {
        // 30 accented chars, 60 bytes: still under the 50-character floor.
        let thin_plan = StartStrategy::FollowUpRequired {
            follow_up_method: "email".to_string(),
            plan_note: "é".repeat(30),
            require_acknowledgement: None,
        };
        let err = check_start(&thin_plan, &[]).unwrap_err();
        assert!(err.to_string().contains("at least 50 characters"));
    }

    #[test]
    fn add_context_opens_one_required_task() {
        let tasks = task_batch(&StartStrategy::AddContext, Severity::Critical, due());
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].required);
        assert_eq!(tasks[0].due_date, due());
        assert_eq!(
            tasks[0].title,
            "Add compliance context + link transcript evidence"
        );
    }

    #[test]
    fn unacknowledged_disclosure_adds_a_follow_on_task_a_week_later() {
        let tasks = task_batch(
            &disclosure_strategy(AcknowledgementStatus::No),
            Severity::Warn,
            due(),
        );
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "Obtain client acknowledgement");
        assert_eq!(tasks[1].due_date, due() + Duration::days(7));

        let tasks = task_batch(
            &disclosure_strategy(AcknowledgementStatus::Yes),
            Severity::Warn,
            due(),
        );
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn critical_follow_up_collects_acknowledgement_by_default() {
        let tasks = task_batch(&follow_up_strategy(None), Severity::Critical, due());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "Collect acknowledgement");

        let tasks = task_batch(&follow_up_strategy(None), Severity::Warn, due());
        assert_eq!(tasks.len(), 1);

        let tasks = task_batch(&follow_up_strategy(Some(false)), Severity::Critical, due());
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn submission_checks_accumulated_evidence_per_strategy() {
        let metadata = ResolutionMetadata::AddContext;
        let err = check_submission(
            ResolutionType::AddContext,
            &metadata,
            Severity::Warn,
            &[EvidenceType::Note],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Transcript evidence"));

        check_submission(
            ResolutionType::AddContext,
            &metadata,
            Severity::Warn,
            &[EvidenceType::TranscriptSnippet],
        )
        .unwrap();
    }

    #[test]
    fn critical_follow_up_submission_requires_acknowledgement_evidence() {
        let metadata = ResolutionMetadata::FollowUp {
            follow_up_method: "email".to_string(),
            plan_note: "plan".to_string(),
            require_acknowledgement: None,
        };

        let err = check_submission(
            ResolutionType::FollowUpRequired,
            &metadata,
            Severity::Critical,
            &[EvidenceType::OutreachProof],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Acknowledgement evidence"));

        check_submission(
            ResolutionType::FollowUpRequired,
            &metadata,
            Severity::Critical,
            &[EvidenceType::OutreachProof, EvidenceType::Acknowledgement],
        )
        .unwrap();
    }

    #[test]
    fn explicit_opt_out_waives_the_acknowledgement_check() {
        let metadata = ResolutionMetadata::FollowUp {
            follow_up_method: "phone".to_string(),
            plan_note: "plan".to_string(),
            require_acknowledgement: Some(false),
        };
        check_submission(
            ResolutionType::FollowUpRequired,
            &metadata,
            Severity::Critical,
            &[EvidenceType::OutreachProof],
        )
        .unwrap();
    }
}

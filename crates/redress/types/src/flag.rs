//! Compliance flags raised against recorded meetings.

use crate::{FlagId, MeetingId, ResolutionType, UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How urgent a flag is. Critical flags require human verification before
/// closure; warn flags auto-approve on submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warn,
    Critical,
}

impl Severity {
    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

/// Flag lifecycle states. Transitions happen only through the workflow
/// engine; `Closed` and `ClosedAcceptedRisk` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagStatus {
    Open,
    InRemediation,
    PendingVerification,
    Closed,
    ClosedAcceptedRisk,
}

impl FlagStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlagStatus::Closed | FlagStatus::ClosedAcceptedRisk)
    }
}

/// Pointer back to the claim that triggered the flag, e.g. a recommendation
/// uttered at a given transcript offset.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginatingEvidence {
    pub description: String,
    /// Seconds into the meeting recording, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
}

/// A detected compliance issue tied to one meeting.
///
/// Created by the external detection pipeline in status `Open`, mutated
/// only by the workflow engine, never deleted (retained for audit).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub id: FlagId,
    pub workspace_id: WorkspaceId,
    pub meeting_id: MeetingId,
    /// Category tag assigned by the detection pipeline
    /// (e.g. "UNSUPPORTED_RECOMMENDATION").
    pub flag_type: String,
    pub severity: Severity,
    pub status: FlagStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originating_evidence: Option<OriginatingEvidence>,
    /// Set once a remediation path is chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_type: Option<ResolutionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Flag {
    /// Create a new open flag, as the detection pipeline would.
    pub fn new(
        workspace_id: WorkspaceId,
        meeting_id: MeetingId,
        flag_type: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: FlagId::generate(),
            workspace_id,
            meeting_id,
            flag_type: flag_type.into(),
            severity,
            status: FlagStatus::Open,
            originating_evidence: None,
            resolution_type: None,
            resolution_note: None,
            resolved_at: None,
            resolved_by_user_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_originating_evidence(mut self, evidence: OriginatingEvidence) -> Self {
        self.originating_evidence = Some(evidence);
        self
    }
}

//! Reviewer decisions on submitted remediations.

use crate::{ResolutionId, UserId, VerificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationDecision {
    Approved,
    Rejected,
}

/// One reviewer decision event. History is preserved: a rejection can be
/// followed by a re-submission and a later approval, each with its own row.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: VerificationId,
    pub resolution_id: ResolutionId,
    pub reviewer_id: UserId,
    pub decision: VerificationDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl Verification {
    pub fn new(
        resolution_id: ResolutionId,
        reviewer_id: UserId,
        decision: VerificationDecision,
        note: Option<String>,
    ) -> Self {
        Self {
            id: VerificationId::generate(),
            resolution_id,
            reviewer_id,
            decision,
            note,
            decided_at: Utc::now(),
        }
    }
}

//! Resolution records: the chosen remediation strategy for a flag.
//!
//! Strategy-specific fields are a closed set of variants rather than an
//! open metadata map, so a disclosure record cannot exist without its
//! source type and a follow-up record cannot exist without its plan note.

use crate::{FlagId, ResolutionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The remediation path chosen for a flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionType {
    AddContext,
    DisclosedElsewhere,
    FollowUpRequired,
    OverrideApproved,
}

/// Whether the client has acknowledged a disclosure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcknowledgementStatus {
    Yes,
    No,
    Unknown,
}

/// Strategy fields supplied when remediation starts.
///
/// Tagged by `resolutionType` on the wire, matching the action payload of
/// the remediation API. Override is deliberately absent: overrides go
/// through the `OVERRIDE` action, never through `START_REMEDIATION`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "resolutionType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartStrategy {
    AddContext,
    #[serde(rename_all = "camelCase")]
    DisclosedElsewhere {
        source_type: String,
        disclosure_date: DateTime<Utc>,
        acknowledgement_status: AcknowledgementStatus,
    },
    #[serde(rename_all = "camelCase")]
    FollowUpRequired {
        follow_up_method: String,
        plan_note: String,
        /// Explicit acknowledgement requirement. When absent the policy
        /// falls back to the flag's severity.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        require_acknowledgement: Option<bool>,
    },
}

impl StartStrategy {
    pub fn resolution_type(&self) -> ResolutionType {
        match self {
            StartStrategy::AddContext => ResolutionType::AddContext,
            StartStrategy::DisclosedElsewhere { .. } => ResolutionType::DisclosedElsewhere,
            StartStrategy::FollowUpRequired { .. } => ResolutionType::FollowUpRequired,
        }
    }

    /// The metadata variant persisted on the resolution record.
    pub fn into_metadata(self) -> ResolutionMetadata {
        match self {
            StartStrategy::AddContext => ResolutionMetadata::AddContext,
            StartStrategy::DisclosedElsewhere {
                source_type,
                disclosure_date,
                acknowledgement_status,
            } => ResolutionMetadata::Disclosure {
                source_type,
                disclosure_date,
                acknowledgement_status,
            },
            StartStrategy::FollowUpRequired {
                follow_up_method,
                plan_note,
                require_acknowledgement,
            } => ResolutionMetadata::FollowUp {
                follow_up_method,
                plan_note,
                require_acknowledgement,
            },
        }
    }
}

/// Strategy-specific structured fields stored on a resolution record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionMetadata {
    AddContext,
    #[serde(rename_all = "camelCase")]
    Disclosure {
        source_type: String,
        disclosure_date: DateTime<Utc>,
        acknowledgement_status: AcknowledgementStatus,
    },
    #[serde(rename_all = "camelCase")]
    FollowUp {
        follow_up_method: String,
        plan_note: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        require_acknowledgement: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    Override {
        category: String,
    },
}

impl ResolutionMetadata {
    /// The explicit acknowledgement requirement, when one was supplied.
    pub fn explicit_acknowledgement_requirement(&self) -> Option<bool> {
        match self {
            ResolutionMetadata::FollowUp {
                require_acknowledgement,
                ..
            } => *require_acknowledgement,
            _ => None,
        }
    }
}

/// The chosen remediation strategy for one flag. One-to-one with the flag;
/// closed when the flag reaches a terminal status.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRecord {
    pub id: ResolutionId,
    pub flag_id: FlagId,
    pub resolution_type: ResolutionType,
    pub rationale: String,
    pub metadata: ResolutionMetadata,
    pub created_by_user_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_for_verification_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by_user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_category: Option<String>,
}

impl ResolutionRecord {
    pub fn new(
        flag_id: FlagId,
        resolution_type: ResolutionType,
        rationale: impl Into<String>,
        metadata: ResolutionMetadata,
        created_by_user_id: UserId,
    ) -> Self {
        Self {
            id: ResolutionId::generate(),
            flag_id,
            resolution_type,
            rationale: rationale.into(),
            metadata,
            created_by_user_id,
            created_at: Utc::now(),
            submitted_for_verification_at: None,
            closed_at: None,
            closed_by_user_id: None,
            override_reason: None,
            override_category: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}

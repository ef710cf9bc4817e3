//! Evidence artifacts supporting a remediation claim.
//!
//! Evidence is append-only: rows are never edited or deleted. Corrections
//! are made by adding superseding evidence, preserving history for audit.

use crate::{EvidenceId, ResolutionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of supporting artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceType {
    TranscriptSnippet,
    DocumentLink,
    OutreachProof,
    Acknowledgement,
    Note,
}

/// Structured payload carried by some evidence kinds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidenceDetail {
    #[serde(rename_all = "camelCase")]
    TranscriptSnippet {
        /// Seconds into the meeting recording.
        start_time: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snippet: Option<String>,
    },
    Note { note: String },
}

/// Evidence as submitted by a caller, before the engine assigns it a row.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceInput {
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Structured payload; `metadata` on the wire for compatibility with
    /// the historical loosely-typed bag.
    #[serde(
        rename = "metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub detail: Option<EvidenceDetail>,
}

impl EvidenceInput {
    pub fn new(evidence_type: EvidenceType) -> Self {
        Self {
            evidence_type,
            label: None,
            url: None,
            detail: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_detail(mut self, detail: EvidenceDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Label with surrounding whitespace stripped; empty labels collapse
    /// to `None`.
    pub fn normalized_label(&self) -> Option<String> {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_owned)
    }

    /// A transcript snippet anchored to a numeric offset in the recording.
    pub fn is_anchored_transcript_snippet(&self) -> bool {
        self.evidence_type == EvidenceType::TranscriptSnippet
            && matches!(self.detail, Some(EvidenceDetail::TranscriptSnippet { .. }))
    }

    /// A document link with a non-empty url.
    pub fn is_linked_document(&self) -> bool {
        self.evidence_type == EvidenceType::DocumentLink
            && self
                .url
                .as_deref()
                .map(str::trim)
                .is_some_and(|url| !url.is_empty())
    }
}

/// A persisted supporting artifact attached to a resolution record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceLink {
    pub id: EvidenceId,
    pub resolution_id: ResolutionId,
    pub evidence_type: EvidenceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "metadata", skip_serializing_if = "Option::is_none")]
    pub detail: Option<EvidenceDetail>,
    pub created_by_user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl EvidenceLink {
    /// Materialize submitted evidence into a row on a resolution record.
    pub fn from_input(
        resolution_id: ResolutionId,
        input: EvidenceInput,
        created_by_user_id: UserId,
    ) -> Self {
        let label = input.normalized_label();
        Self {
            id: EvidenceId::generate(),
            resolution_id,
            evidence_type: input.evidence_type,
            label,
            url: input.url,
            detail: input.detail,
            created_by_user_id,
            created_at: Utc::now(),
        }
    }
}

//! Redress Types - the domain model for flag remediation
//!
//! A compliance Flag is raised against a recorded client meeting by the
//! detection pipeline. Everything after that point - choosing a resolution
//! strategy, collecting evidence, working tasks, human verification - is
//! expressed through the row types in this crate. Rows are mutated only by
//! the workflow engine; nothing here deletes.

#![deny(unsafe_code)]

mod evidence;
mod flag;
mod ids;
mod resolution;
mod role;
mod task;
mod verification;

pub use evidence::{EvidenceDetail, EvidenceInput, EvidenceLink, EvidenceType};
pub use flag::{Flag, FlagStatus, OriginatingEvidence, Severity};
pub use ids::{
    EvidenceId, FlagId, MeetingId, ResolutionId, TaskId, UserId, VerificationId, WorkspaceId,
};
pub use resolution::{
    AcknowledgementStatus, ResolutionMetadata, ResolutionRecord, ResolutionType, StartStrategy,
};
pub use role::{Actor, UserRole};
pub use task::{ActionItem, TaskStatus};
pub use verification::{Verification, VerificationDecision};

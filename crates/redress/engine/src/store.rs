//! In-memory workflow store.
//!
//! All five row kinds live behind one lock so that each action's
//! precondition reads, writes, and audit emission happen in a single
//! critical section. The `resolution_by_flag` index doubles as the unique
//! constraint that makes a racing second `StartRemediation` fail safely
//! instead of creating a duplicate record.

use crate::WorkflowError;
use redress_types::{
    ActionItem, EvidenceId, EvidenceLink, Flag, FlagId, ResolutionId, ResolutionRecord, TaskId,
    Verification, VerificationId, WorkspaceId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A flag with everything hanging off its resolution record, as loaded for
/// precondition checks and returned to read callers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDetail {
    pub flag: Flag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionRecord>,
    pub tasks: Vec<ActionItem>,
    pub evidence: Vec<EvidenceLink>,
    pub verifications: Vec<Verification>,
}

#[derive(Default)]
pub(crate) struct Tables {
    pub(crate) flags: HashMap<FlagId, Flag>,
    pub(crate) resolutions: HashMap<ResolutionId, ResolutionRecord>,
    /// Unique index: at most one live resolution record per flag.
    pub(crate) resolution_by_flag: HashMap<FlagId, ResolutionId>,
    pub(crate) tasks: HashMap<TaskId, ActionItem>,
    pub(crate) tasks_by_resolution: HashMap<ResolutionId, Vec<TaskId>>,
    pub(crate) evidence: HashMap<EvidenceId, EvidenceLink>,
    pub(crate) evidence_by_resolution: HashMap<ResolutionId, Vec<EvidenceId>>,
    pub(crate) verifications: HashMap<VerificationId, Verification>,
    pub(crate) verifications_by_resolution: HashMap<ResolutionId, Vec<VerificationId>>,
}

impl Tables {
    /// Load a flag, enforcing the caller's workspace boundary. A flag in
    /// another workspace is indistinguishable from a missing one.
    pub(crate) fn flag_in_workspace(
        &self,
        workspace_id: &WorkspaceId,
        flag_id: &FlagId,
    ) -> Result<&Flag, WorkflowError> {
        self.flags
            .get(flag_id)
            .filter(|flag| &flag.workspace_id == workspace_id)
            .ok_or_else(|| WorkflowError::NotFound("Flag not found".to_string()))
    }

    pub(crate) fn resolution_for_flag(&self, flag_id: &FlagId) -> Option<&ResolutionRecord> {
        self.resolution_by_flag
            .get(flag_id)
            .and_then(|resolution_id| self.resolutions.get(resolution_id))
    }

    /// Insert a resolution record, upholding the one-per-flag constraint.
    pub(crate) fn insert_resolution(
        &mut self,
        record: ResolutionRecord,
    ) -> Result<(), WorkflowError> {
        if self.resolution_by_flag.contains_key(&record.flag_id) {
            return Err(WorkflowError::InvalidState(
                "Remediation already started for this flag".to_string(),
            ));
        }
        self.resolution_by_flag
            .insert(record.flag_id.clone(), record.id.clone());
        self.resolutions.insert(record.id.clone(), record);
        Ok(())
    }

    pub(crate) fn detail_for(&self, flag: &Flag) -> FlagDetail {
        let resolution = self.resolution_for_flag(&flag.id).cloned();
        let (tasks, evidence, verifications) = match &resolution {
            Some(record) => (
                self.tasks_for(&record.id),
                self.evidence_for(&record.id),
                self.verifications_for(&record.id),
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };
        FlagDetail {
            flag: flag.clone(),
            resolution,
            tasks,
            evidence,
            verifications,
        }
    }

    pub(crate) fn append_verification(&mut self, verification: Verification) {
        self.verifications_by_resolution
            .entry(verification.resolution_id.clone())
            .or_default()
            .push(verification.id.clone());
        self.verifications
            .insert(verification.id.clone(), verification);
    }

    pub(crate) fn verifications_for(&self, resolution_id: &ResolutionId) -> Vec<Verification> {
        self.verifications_by_resolution
            .get(resolution_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.verifications.get(id).cloned())
            .collect()
    }
}

/// The shared store handle. Flags are inserted by the detection pipeline
/// collaborator; everything else is written by the engine.
#[derive(Default)]
pub struct WorkflowStore {
    inner: RwLock<Tables>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a flag produced by the detection pipeline. Rejects duplicate
    /// ids; flags are never replaced or deleted.
    pub fn insert_flag(&self, flag: Flag) -> Result<(), WorkflowError> {
        let mut tables = self.write()?;
        if tables.flags.contains_key(&flag.id) {
            return Err(WorkflowError::InvalidState(format!(
                "Flag {} already exists",
                flag.id
            )));
        }
        tables.flags.insert(flag.id.clone(), flag);
        Ok(())
    }

    /// Read a flag with its full resolution tree, workspace-scoped.
    pub fn get_flag(
        &self,
        workspace_id: &WorkspaceId,
        flag_id: &FlagId,
    ) -> Result<FlagDetail, WorkflowError> {
        let tables = self.read()?;
        let flag = tables.flag_in_workspace(workspace_id, flag_id)?;
        Ok(tables.detail_for(flag))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, WorkflowError> {
        self.inner.write().map_err(|_| WorkflowError::Lock)
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, WorkflowError> {
        self.inner.read().map_err(|_| WorkflowError::Lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redress_types::{
        MeetingId, ResolutionMetadata, ResolutionType, Severity, UserId,
    };

    fn flag() -> Flag {
        Flag::new(
            WorkspaceId::new("ws"),
            MeetingId::new("m1"),
            "MISSING_DISCLOSURE",
            Severity::Warn,
        )
    }

    #[test]
    fn flags_are_invisible_outside_their_workspace() {
        let store = WorkflowStore::new();
        let flag = flag();
        let id = flag.id.clone();
        store.insert_flag(flag).unwrap();

        store.get_flag(&WorkspaceId::new("ws"), &id).unwrap();
        let err = store
            .get_flag(&WorkspaceId::new("other"), &id)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[test]
    fn duplicate_flag_ids_are_rejected() {
        let store = WorkflowStore::new();
        let flag = flag();
        store.insert_flag(flag.clone()).unwrap();
        assert!(store.insert_flag(flag).is_err());
    }

    #[test]
    fn resolution_index_enforces_one_record_per_flag() {
        let store = WorkflowStore::new();
        let flag = flag();
        let flag_id = flag.id.clone();
        store.insert_flag(flag).unwrap();

        let mut tables = store.write().unwrap();
        let first = ResolutionRecord::new(
            flag_id.clone(),
            ResolutionType::AddContext,
            "r".repeat(50),
            ResolutionMetadata::AddContext,
            UserId::new("u1"),
        );
        tables.insert_resolution(first).unwrap();

        let second = ResolutionRecord::new(
            flag_id,
            ResolutionType::AddContext,
            "r".repeat(50),
            ResolutionMetadata::AddContext,
            UserId::new("u2"),
        );
        let err = tables.insert_resolution(second).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }
}

//! Redress Service - dispatch facade over the workflow engine
//!
//! Owns nothing of the workflow itself: parses the action union, routes to
//! the engine under a per-action tracing span, and shapes the result for
//! the caller. The legacy direct-resolve path is permanently retired and
//! answers with a dedicated error so old clients get a clear signal.

#![deny(unsafe_code)]

mod action;

pub use action::RemediationAction;

use redress_audit::{AuditEmitter, RequestContext};
use redress_engine::{
    FlagDetail, RemediationEngine, StartRemediationParams, WorkflowError, WorkflowStore,
};
use redress_types::{ActionItem, Actor, EvidenceLink, Flag, FlagId, ResolutionRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors: workflow failures plus the retired legacy path.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Direct flag resolution has been replaced by the remediation workflow")]
    LegacyResolveDisabled,
}

/// What a successful action hands back. The flag is always present;
/// the other fields carry whatever rows the action created or touched.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub flag: Flag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<ActionItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<ActionItem>,
}

impl ActionOutcome {
    fn flag_only(flag: Flag) -> Self {
        Self {
            flag,
            resolution: None,
            tasks: Vec::new(),
            evidence: None,
            task: None,
        }
    }
}

/// The workflow facade handed to transports and embedders.
pub struct RemediationService {
    engine: RemediationEngine,
}

impl RemediationService {
    pub fn new(store: Arc<WorkflowStore>, audit: Arc<dyn AuditEmitter>) -> Self {
        Self {
            engine: RemediationEngine::new(store, audit),
        }
    }

    pub fn store(&self) -> &WorkflowStore {
        self.engine.store()
    }

    /// Route one action to the engine.
    pub fn handle(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        action: RemediationAction,
        context: &RequestContext,
    ) -> Result<ActionOutcome, ServiceError> {
        let span = tracing::info_span!(
            "remediation_action",
            action = action.kind(),
            flag = %flag_id,
            user = %actor.user_id,
        );
        let _guard = span.enter();

        let outcome = match action {
            RemediationAction::StartRemediation {
                strategy,
                rationale,
                due_date,
                evidence,
            } => {
                let outcome = self.engine.start_remediation(
                    actor,
                    flag_id,
                    StartRemediationParams {
                        strategy,
                        rationale,
                        due_date,
                        evidence,
                    },
                    context,
                )?;
                ActionOutcome {
                    flag: outcome.flag,
                    resolution: Some(outcome.resolution),
                    tasks: outcome.tasks,
                    evidence: None,
                    task: None,
                }
            }
            RemediationAction::AddEvidence { evidence } => {
                let link = self.engine.add_evidence(actor, flag_id, evidence, context)?;
                let detail = self.store().get_flag(&actor.workspace_id, flag_id)?;
                ActionOutcome {
                    evidence: Some(link),
                    ..ActionOutcome::flag_only(detail.flag)
                }
            }
            RemediationAction::CompleteTask {
                task_id,
                completion_note,
            } => {
                let task =
                    self.engine
                        .complete_task(actor, flag_id, &task_id, completion_note, context)?;
                let detail = self.store().get_flag(&actor.workspace_id, flag_id)?;
                ActionOutcome {
                    task: Some(task),
                    ..ActionOutcome::flag_only(detail.flag)
                }
            }
            RemediationAction::SubmitForVerification => ActionOutcome::flag_only(
                self.engine.submit_for_verification(actor, flag_id, context)?,
            ),
            RemediationAction::Approve { note } => {
                ActionOutcome::flag_only(self.engine.approve(actor, flag_id, note, context)?)
            }
            RemediationAction::Reject { note } => {
                ActionOutcome::flag_only(self.engine.reject(actor, flag_id, note, context)?)
            }
            RemediationAction::Override { reason, category } => ActionOutcome::flag_only(
                self.engine
                    .override_flag(actor, flag_id, reason, category, context)?,
            ),
        };

        Ok(outcome)
    }

    /// Read a flag with its full resolution tree.
    pub fn get_flag(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
    ) -> Result<FlagDetail, ServiceError> {
        Ok(self.store().get_flag(&actor.workspace_id, flag_id)?)
    }

    /// The pre-workflow direct resolve path. Retired: flags now close only
    /// through remediation or an override.
    pub fn resolve_flag_directly(
        &self,
        _actor: &Actor,
        _flag_id: &FlagId,
    ) -> Result<ActionOutcome, ServiceError> {
        Err(ServiceError::LegacyResolveDisabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redress_audit::AuditLog;
    use redress_types::{
        EvidenceDetail, EvidenceInput, EvidenceType, FlagStatus, MeetingId, Severity,
        StartStrategy, UserId, UserRole, WorkspaceId,
    };

    fn service() -> (RemediationService, Arc<AuditLog>) {
        let store = Arc::new(WorkflowStore::new());
        let log = Arc::new(AuditLog::new());
        (RemediationService::new(store, log.clone()), log)
    }

    fn seed_flag(service: &RemediationService, severity: Severity) -> FlagId {
        let flag = Flag::new(
            WorkspaceId::new("ws"),
            MeetingId::new("m1"),
            "MISSING_DISCLOSURE",
            severity,
        );
        let id = flag.id.clone();
        service.store().insert_flag(flag).unwrap();
        id
    }

    fn advisor() -> Actor {
        Actor::new(UserId::new("advisor"), WorkspaceId::new("ws"), UserRole::Member)
    }

    fn cco() -> Actor {
        Actor::new(UserId::new("cco"), WorkspaceId::new("ws"), UserRole::OwnerCco)
    }

    fn start_action() -> RemediationAction {
        RemediationAction::StartRemediation {
            strategy: StartStrategy::AddContext,
            rationale: "context was given verbally at minute two of the recording".to_string(),
            due_date: chrono::Utc::now() + chrono::Duration::days(3),
            evidence: vec![EvidenceInput::new(EvidenceType::TranscriptSnippet)
                .with_detail(EvidenceDetail::TranscriptSnippet {
                    start_time: 120.0,
                    snippet: None,
                })],
        }
    }

    #[test]
    fn start_outcome_carries_the_resolution_and_tasks() {
        let (service, _) = service();
        let flag_id = seed_flag(&service, Severity::Critical);

        let outcome = service
            .handle(&advisor(), &flag_id, start_action(), &RequestContext::default())
            .unwrap();
        assert_eq!(outcome.flag.status, FlagStatus::InRemediation);
        assert!(outcome.resolution.is_some());
        assert_eq!(outcome.tasks.len(), 1);
        assert!(outcome.evidence.is_none());
    }

    #[test]
    fn a_full_critical_lifecycle_through_the_action_union() {
        let (service, log) = service();
        let flag_id = seed_flag(&service, Severity::Critical);
        let actor = advisor();
        let ctx = RequestContext::default();

        let outcome = service
            .handle(&actor, &flag_id, start_action(), &ctx)
            .unwrap();
        for task in outcome.tasks {
            service
                .handle(
                    &actor,
                    &flag_id,
                    RemediationAction::CompleteTask {
                        task_id: task.id,
                        completion_note: None,
                    },
                    &ctx,
                )
                .unwrap();
        }
        let outcome = service
            .handle(
                &actor,
                &flag_id,
                RemediationAction::SubmitForVerification,
                &ctx,
            )
            .unwrap();
        assert_eq!(outcome.flag.status, FlagStatus::PendingVerification);

        let outcome = service
            .handle(
                &cco(),
                &flag_id,
                RemediationAction::Approve { note: None },
                &ctx,
            )
            .unwrap();
        assert_eq!(outcome.flag.status, FlagStatus::Closed);

        // start + task + submit + approve; no standalone evidence adds.
        let events = log.events_for_resource(&flag_id.to_string()).unwrap();
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn engine_errors_surface_through_the_facade() {
        let (service, _) = service();
        let flag_id = seed_flag(&service, Severity::Critical);

        let err = service
            .handle(
                &advisor(),
                &flag_id,
                RemediationAction::SubmitForVerification,
                &RequestContext::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Workflow(WorkflowError::InvalidState(_))
        ));
    }

    #[test]
    fn outcome_serializes_with_camel_case_keys() {
        let (service, _) = service();
        let flag_id = seed_flag(&service, Severity::Warn);

        let outcome = service
            .handle(&advisor(), &flag_id, start_action(), &RequestContext::default())
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["flag"]["status"], "IN_REMEDIATION");
        assert!(json["flag"].get("meetingId").is_some());
        assert_eq!(json["resolution"]["resolutionType"], "ADD_CONTEXT");
        // Nothing was completed or rejected yet, so optional keys stay off.
        assert!(json.get("task").is_none());
        assert!(json.get("evidence").is_none());
    }

    #[test]
    fn the_legacy_resolve_path_is_retired() {
        let (service, _) = service();
        let flag_id = seed_flag(&service, Severity::Warn);

        let err = service
            .resolve_flag_directly(&advisor(), &flag_id)
            .unwrap_err();
        assert!(matches!(err, ServiceError::LegacyResolveDisabled));
    }
}

//! The remediation state machine.
//!
//! Each action loads the flag and its resolution tree, checks the
//! transition preconditions and the resolution policy, stages every row it
//! intends to write, emits the audit event(s), and only then applies the
//! staged rows - all while holding the store's write lock. Application is
//! infallible, so a failure anywhere earlier leaves the store untouched.

use crate::gate::VerificationGate;
use crate::store::WorkflowStore;
use crate::WorkflowError;
use chrono::{DateTime, Utc};
use redress_audit::{AuditAction, AuditEmitter, AuditEvent, RequestContext};
use redress_policy as policy;
use redress_types::{
    ActionItem, Actor, EvidenceInput, EvidenceLink, EvidenceType, Flag, FlagId, FlagStatus,
    ResolutionMetadata, ResolutionRecord, ResolutionType, StartStrategy, TaskId, Verification,
    VerificationDecision,
};
use serde_json::Value;
use std::sync::Arc;

pub(crate) const MIN_RATIONALE_LEN: usize = 50;
pub(crate) const MIN_REJECT_NOTE_LEN: usize = 10;
pub(crate) const MIN_OVERRIDE_REASON_LEN: usize = 20;
pub(crate) const MIN_OVERRIDE_CATEGORY_LEN: usize = 2;

/// Payload for `START_REMEDIATION`.
#[derive(Clone, Debug)]
pub struct StartRemediationParams {
    pub strategy: StartStrategy,
    pub rationale: String,
    pub due_date: DateTime<Utc>,
    pub evidence: Vec<EvidenceInput>,
}

/// Everything created by a successful remediation start.
#[derive(Clone, Debug)]
pub struct StartOutcome {
    pub flag: Flag,
    pub resolution: ResolutionRecord,
    pub tasks: Vec<ActionItem>,
}

/// The workflow engine. Shared freely; every action serializes on the
/// store's write lock.
pub struct RemediationEngine {
    store: Arc<WorkflowStore>,
    audit: Arc<dyn AuditEmitter>,
    gate: VerificationGate,
}

impl RemediationEngine {
    pub fn new(store: Arc<WorkflowStore>, audit: Arc<dyn AuditEmitter>) -> Self {
        Self {
            store,
            audit,
            gate: VerificationGate::new(),
        }
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    /// Begin remediation on an open flag: create the resolution record,
    /// the policy's task batch, and any accompanying evidence, then move
    /// the flag to `IN_REMEDIATION`.
    pub fn start_remediation(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        params: StartRemediationParams,
        context: &RequestContext,
    ) -> Result<StartOutcome, WorkflowError> {
        let rationale = params.rationale.trim().to_string();
        if rationale.chars().count() < MIN_RATIONALE_LEN {
            return Err(WorkflowError::Validation(format!(
                "Rationale must be at least {MIN_RATIONALE_LEN} characters"
            )));
        }

        let mut tables = self.store.write()?;
        let flag = tables
            .flag_in_workspace(&actor.workspace_id, flag_id)?
            .clone();

        if flag.status != FlagStatus::Open {
            return Err(WorkflowError::InvalidState(
                "Remediation can only be started for open flags".to_string(),
            ));
        }
        if tables.resolution_for_flag(flag_id).is_some() {
            return Err(WorkflowError::InvalidState(
                "Remediation already started for this flag".to_string(),
            ));
        }

        policy::check_start(&params.strategy, &params.evidence)?;
        let blueprints = policy::task_batch(&params.strategy, flag.severity, params.due_date);

        let resolution_type = params.strategy.resolution_type();
        let resolution = ResolutionRecord::new(
            flag.id.clone(),
            resolution_type,
            rationale.clone(),
            params.strategy.into_metadata(),
            actor.user_id.clone(),
        );

        let tasks: Vec<ActionItem> = blueprints
            .into_iter()
            .map(|blueprint| {
                ActionItem::new(
                    resolution.id.clone(),
                    blueprint.title,
                    actor.user_id.clone(),
                    blueprint.due_date,
                    blueprint.required,
                )
            })
            .collect();

        let evidence: Vec<EvidenceLink> = params
            .evidence
            .iter()
            .cloned()
            .map(|input| EvidenceLink::from_input(resolution.id.clone(), input, actor.user_id.clone()))
            .collect();

        let mut updated_flag = flag.clone();
        updated_flag.status = FlagStatus::InRemediation;
        updated_flag.resolution_type = Some(resolution_type);
        updated_flag.resolution_note = Some(rationale.clone());

        // Both events hand off in one batch so a failing sink emits neither.
        let mut events = vec![self
            .event(actor, &flag, AuditAction::RemediationStart)
            .with_meta("resolutionType", resolution_type_name(resolution_type))
            .with_meta("rationale", rationale)
            .with_meta("taskCount", tasks.len())
            .with_request_context(context)];
        if !evidence.is_empty() {
            let types: Vec<Value> = evidence
                .iter()
                .map(|link| Value::String(evidence_type_name(link.evidence_type).to_string()))
                .collect();
            events.push(
                self.event(actor, &flag, AuditAction::EvidenceAdd)
                    .with_meta("count", evidence.len())
                    .with_meta("types", types)
                    .with_request_context(context),
            );
        }
        self.audit.record_all(events)?;

        tables.insert_resolution(resolution.clone())?;
        tables.insert_tasks(tasks.clone());
        for link in evidence {
            tables.append_evidence(link);
        }
        tables
            .flags
            .insert(updated_flag.id.clone(), updated_flag.clone());

        tracing::info!(
            flag = %updated_flag.id,
            resolution = %resolution.id,
            strategy = resolution_type_name(resolution_type),
            "remediation started"
        );

        Ok(StartOutcome {
            flag: updated_flag,
            resolution,
            tasks,
        })
    }

    /// Append one evidence artifact to a live remediation. No transition.
    pub fn add_evidence(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        input: EvidenceInput,
        context: &RequestContext,
    ) -> Result<EvidenceLink, WorkflowError> {
        let mut tables = self.store.write()?;
        let flag = tables
            .flag_in_workspace(&actor.workspace_id, flag_id)?
            .clone();
        let resolution = tables
            .resolution_for_flag(flag_id)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::InvalidState("Remediation has not started".to_string())
            })?;
        if flag.status.is_terminal() {
            return Err(WorkflowError::InvalidState(
                "Evidence cannot be added to a closed flag".to_string(),
            ));
        }

        let link = EvidenceLink::from_input(resolution.id, input, actor.user_id.clone());

        self.audit.record(
            self.event(actor, &flag, AuditAction::EvidenceAdd)
                .with_meta("evidenceId", link.id.to_string())
                .with_meta("type", evidence_type_name(link.evidence_type))
                .with_request_context(context),
        )?;

        tables.append_evidence(link.clone());
        Ok(link)
    }

    /// Complete one task on the flag's remediation.
    pub fn complete_task(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        task_id: &TaskId,
        completion_note: Option<String>,
        context: &RequestContext,
    ) -> Result<ActionItem, WorkflowError> {
        let mut tables = self.store.write()?;
        let flag = tables
            .flag_in_workspace(&actor.workspace_id, flag_id)?
            .clone();
        let resolution = tables
            .resolution_for_flag(flag_id)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::InvalidState("Remediation has not started".to_string())
            })?;

        let mut task = tables.task_in_resolution(&resolution.id, task_id)?.clone();
        task.complete(completion_note);

        self.audit.record(
            self.event(actor, &flag, AuditAction::TaskUpdate)
                .with_meta("taskId", task.id.to_string())
                .with_meta("status", "COMPLETED")
                .with_request_context(context),
        )?;

        tables.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    /// Submit a remediation for verification. Critical flags move to
    /// `PENDING_VERIFICATION`; warn flags auto-approve and close.
    pub fn submit_for_verification(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        context: &RequestContext,
    ) -> Result<Flag, WorkflowError> {
        let mut tables = self.store.write()?;
        let flag = tables
            .flag_in_workspace(&actor.workspace_id, flag_id)?
            .clone();
        if flag.status != FlagStatus::InRemediation {
            return Err(WorkflowError::InvalidState(
                "Flag is not in remediation".to_string(),
            ));
        }
        let resolution = tables
            .resolution_for_flag(flag_id)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::InvalidState("Remediation has not started".to_string())
            })?;

        if !tables.all_required_complete(&resolution.id) {
            return Err(WorkflowError::IncompleteTasks(
                "All required tasks must be completed before submission.".to_string(),
            ));
        }
        let accumulated = tables.evidence_types_for(&resolution.id);
        policy::check_submission(
            resolution.resolution_type,
            &resolution.metadata,
            flag.severity,
            &accumulated,
        )?;

        let now = Utc::now();
        let mut updated_resolution = resolution;
        updated_resolution.submitted_for_verification_at = Some(now);

        let mut updated_flag = flag.clone();
        let mut auto_approval = None;
        if flag.severity.is_critical() {
            updated_flag.status = FlagStatus::PendingVerification;
        } else {
            updated_flag.status = FlagStatus::Closed;
            updated_flag.resolved_at = Some(now);
            updated_flag.resolved_by_user_id = Some(actor.user_id.clone());
            updated_resolution.closed_at = Some(now);
            updated_resolution.closed_by_user_id = Some(actor.user_id.clone());
            auto_approval = Some(Verification::new(
                updated_resolution.id.clone(),
                actor.user_id.clone(),
                VerificationDecision::Approved,
                Some("Auto-approved (non-critical)".to_string()),
            ));
        }

        self.audit.record(
            self.event(actor, &flag, AuditAction::RemediationUpdate)
                .with_meta("status", flag_status_name(updated_flag.status))
                .with_request_context(context),
        )?;

        tables
            .resolutions
            .insert(updated_resolution.id.clone(), updated_resolution);
        if let Some(verification) = auto_approval {
            tables.append_verification(verification);
        }
        tables
            .flags
            .insert(updated_flag.id.clone(), updated_flag.clone());

        tracing::info!(
            flag = %updated_flag.id,
            status = flag_status_name(updated_flag.status),
            "remediation submitted"
        );
        Ok(updated_flag)
    }

    /// Approve a pending verification and close the flag. Reviewer only.
    pub fn approve(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        note: Option<String>,
        context: &RequestContext,
    ) -> Result<Flag, WorkflowError> {
        self.gate
            .authorize(actor, "Only CCO can approve remediation")?;
        self.verify(
            actor,
            flag_id,
            VerificationDecision::Approved,
            normalize_note(note),
            context,
        )
    }

    /// Reject a pending verification, returning the flag to remediation.
    /// Reviewer only; the note is mandatory and must be substantial.
    pub fn reject(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        note: String,
        context: &RequestContext,
    ) -> Result<Flag, WorkflowError> {
        self.gate.authorize(actor, "Only CCO can reject remediation")?;
        let note = note.trim().to_string();
        if note.chars().count() < MIN_REJECT_NOTE_LEN {
            return Err(WorkflowError::Validation(format!(
                "Rejection note must be at least {MIN_REJECT_NOTE_LEN} characters"
            )));
        }
        self.verify(
            actor,
            flag_id,
            VerificationDecision::Rejected,
            Some(note),
            context,
        )
    }

    /// Accept risk and close the flag without full remediation. Reviewer
    /// only. Creates the resolution record when none exists; annotates the
    /// live one otherwise. Terminal flags cannot be overridden again.
    pub fn override_flag(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        reason: String,
        category: String,
        context: &RequestContext,
    ) -> Result<Flag, WorkflowError> {
        self.gate.authorize(actor, "Only CCO can override flags")?;
        let reason = reason.trim().to_string();
        if reason.chars().count() < MIN_OVERRIDE_REASON_LEN {
            return Err(WorkflowError::Validation(format!(
                "Override reason must be at least {MIN_OVERRIDE_REASON_LEN} characters"
            )));
        }
        let category = category.trim().to_string();
        if category.chars().count() < MIN_OVERRIDE_CATEGORY_LEN {
            return Err(WorkflowError::Validation(
                "Override category is required".to_string(),
            ));
        }

        let mut tables = self.store.write()?;
        let flag = tables
            .flag_in_workspace(&actor.workspace_id, flag_id)?
            .clone();
        if flag.status.is_terminal() {
            return Err(WorkflowError::InvalidState(
                "Flag is already closed".to_string(),
            ));
        }

        let now = Utc::now();
        let created = tables.resolution_for_flag(flag_id).is_none();
        let mut resolution = match tables.resolution_for_flag(flag_id).cloned() {
            Some(record) => record,
            None => ResolutionRecord::new(
                flag.id.clone(),
                ResolutionType::OverrideApproved,
                reason.clone(),
                ResolutionMetadata::Override {
                    category: category.clone(),
                },
                actor.user_id.clone(),
            ),
        };
        resolution.override_reason = Some(reason.clone());
        resolution.override_category = Some(category.clone());
        resolution.closed_at = Some(now);
        resolution.closed_by_user_id = Some(actor.user_id.clone());

        let verification = self.gate.decide(
            resolution.id.clone(),
            actor,
            VerificationDecision::Approved,
            Some(format!("Accepted risk: {category}")),
        );

        let mut updated_flag = flag.clone();
        updated_flag.status = FlagStatus::ClosedAcceptedRisk;
        updated_flag.resolution_type = Some(ResolutionType::OverrideApproved);
        updated_flag.resolution_note = Some(reason);
        updated_flag.resolved_at = Some(now);
        updated_flag.resolved_by_user_id = Some(actor.user_id.clone());

        self.audit.record(
            self.event(actor, &flag, AuditAction::Override)
                .with_meta("category", category)
                .with_request_context(context),
        )?;

        if created {
            tables.insert_resolution(resolution)?;
        } else {
            tables.resolutions.insert(resolution.id.clone(), resolution);
        }
        tables.append_verification(verification);
        tables
            .flags
            .insert(updated_flag.id.clone(), updated_flag.clone());

        tracing::info!(flag = %updated_flag.id, "flag closed as accepted risk");
        Ok(updated_flag)
    }

    /// Shared approve/reject path: record the decision, move the flag.
    fn verify(
        &self,
        actor: &Actor,
        flag_id: &FlagId,
        decision: VerificationDecision,
        note: Option<String>,
        context: &RequestContext,
    ) -> Result<Flag, WorkflowError> {
        let mut tables = self.store.write()?;
        let flag = tables
            .flag_in_workspace(&actor.workspace_id, flag_id)?
            .clone();
        let resolution = tables.resolution_for_flag(flag_id).cloned();
        let resolution = match resolution {
            Some(record) if flag.status == FlagStatus::PendingVerification => record,
            _ => {
                return Err(WorkflowError::InvalidState(
                    "Flag is not pending verification".to_string(),
                ))
            }
        };

        let verification = self
            .gate
            .decide(resolution.id.clone(), actor, decision, note);

        let now = Utc::now();
        let mut updated_flag = flag.clone();
        let mut updated_resolution = None;
        match decision {
            VerificationDecision::Approved => {
                let mut record = resolution;
                record.closed_at = Some(now);
                record.closed_by_user_id = Some(actor.user_id.clone());
                updated_resolution = Some(record);
                updated_flag.status = FlagStatus::Closed;
                updated_flag.resolved_at = Some(now);
                updated_flag.resolved_by_user_id = Some(actor.user_id.clone());
            }
            VerificationDecision::Rejected => {
                updated_flag.status = FlagStatus::InRemediation;
            }
        }

        self.audit.record(
            self.event(actor, &flag, AuditAction::Verification)
                .with_meta("decision", decision_name(decision))
                .with_request_context(context),
        )?;

        tables.append_verification(verification);
        if let Some(record) = updated_resolution {
            tables.resolutions.insert(record.id.clone(), record);
        }
        tables
            .flags
            .insert(updated_flag.id.clone(), updated_flag.clone());

        tracing::info!(
            flag = %updated_flag.id,
            decision = decision_name(decision),
            "verification recorded"
        );
        Ok(updated_flag)
    }

    fn event(&self, actor: &Actor, flag: &Flag, action: AuditAction) -> AuditEvent {
        AuditEvent::new(
            flag.workspace_id.clone(),
            actor.user_id.clone(),
            action,
            flag.id.to_string(),
            Some(flag.meeting_id.clone()),
        )
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_owned)
}

fn resolution_type_name(resolution_type: ResolutionType) -> &'static str {
    match resolution_type {
        ResolutionType::AddContext => "ADD_CONTEXT",
        ResolutionType::DisclosedElsewhere => "DISCLOSED_ELSEWHERE",
        ResolutionType::FollowUpRequired => "FOLLOW_UP_REQUIRED",
        ResolutionType::OverrideApproved => "OVERRIDE_APPROVED",
    }
}

fn flag_status_name(status: FlagStatus) -> &'static str {
    match status {
        FlagStatus::Open => "OPEN",
        FlagStatus::InRemediation => "IN_REMEDIATION",
        FlagStatus::PendingVerification => "PENDING_VERIFICATION",
        FlagStatus::Closed => "CLOSED",
        FlagStatus::ClosedAcceptedRisk => "CLOSED_ACCEPTED_RISK",
    }
}

fn evidence_type_name(evidence_type: EvidenceType) -> &'static str {
    match evidence_type {
        EvidenceType::TranscriptSnippet => "TRANSCRIPT_SNIPPET",
        EvidenceType::DocumentLink => "DOCUMENT_LINK",
        EvidenceType::OutreachProof => "OUTREACH_PROOF",
        EvidenceType::Acknowledgement => "ACKNOWLEDGEMENT",
        EvidenceType::Note => "NOTE",
    }
}

fn decision_name(decision: VerificationDecision) -> &'static str {
    match decision {
        VerificationDecision::Approved => "APPROVED",
        VerificationDecision::Rejected => "REJECTED",
    }
}

//! End-to-end walkthrough: a critical flag remediated, submitted, and
//! approved, with audit events shipped through the tracing pipeline.
//!
//! Run with `RUST_LOG=info cargo run --example walkthrough`.

use anyhow::Result;
use redress_audit::{RequestContext, TracingEmitter};
use redress_engine::WorkflowStore;
use redress_service::{RemediationAction, RemediationService};
use redress_types::{
    Actor, EvidenceDetail, EvidenceInput, EvidenceType, Flag, MeetingId, Severity, StartStrategy,
    UserId, UserRole, WorkspaceId,
};
use std::sync::Arc;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = Arc::new(WorkflowStore::new());
    let service = RemediationService::new(store, Arc::new(TracingEmitter));

    let workspace = WorkspaceId::new("demo-workspace");
    let flag = Flag::new(
        workspace.clone(),
        MeetingId::new("meeting-001"),
        "UNSUPPORTED_RECOMMENDATION",
        Severity::Critical,
    );
    let flag_id = flag.id.clone();
    service.store().insert_flag(flag)?;

    let advisor = Actor::new(UserId::new("advisor-1"), workspace.clone(), UserRole::Member);
    let cco = Actor::new(UserId::new("cco-1"), workspace, UserRole::OwnerCco);
    let ctx = RequestContext::new(Some("10.0.0.1".to_string()), Some("walkthrough".to_string()));

    let outcome = service.handle(
        &advisor,
        &flag_id,
        RemediationAction::StartRemediation {
            strategy: StartStrategy::AddContext,
            rationale: "suitability context was given verbally two minutes into the call"
                .to_string(),
            due_date: chrono::Utc::now() + chrono::Duration::days(3),
            evidence: vec![EvidenceInput::new(EvidenceType::TranscriptSnippet)
                .with_label("risk discussion")
                .with_detail(EvidenceDetail::TranscriptSnippet {
                    start_time: 128.0,
                    snippet: Some("we walked through the downside scenarios".to_string()),
                })],
        },
        &ctx,
    )?;

    for task in outcome.tasks {
        service.handle(
            &advisor,
            &flag_id,
            RemediationAction::CompleteTask {
                task_id: task.id,
                completion_note: Some("context linked to transcript".to_string()),
            },
            &ctx,
        )?;
    }

    service.handle(
        &advisor,
        &flag_id,
        RemediationAction::SubmitForVerification,
        &ctx,
    )?;
    let outcome = service.handle(
        &cco,
        &flag_id,
        RemediationAction::Approve {
            note: Some("remediation verified against the recording".to_string()),
        },
        &ctx,
    )?;

    let detail = service.get_flag(&cco, &flag_id)?;
    println!("{}", serde_json::to_string_pretty(&detail)?);
    println!("final status: {:?}", outcome.flag.status);
    Ok(())
}

//! Redress Audit - one structured event per accepted transition
//!
//! The workflow engine emits exactly one audit event per successful action
//! (two for a remediation start that arrives with evidence). The emitter
//! contract is the seam to the surrounding system's audit store; this
//! crate also ships an in-memory log for tests and embedded use, and a
//! tracing-backed emitter for log pipelines.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use redress_types::{MeetingId, UserId, WorkspaceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

/// The audited action kinds, one per workflow transition family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RemediationStart,
    EvidenceAdd,
    TaskUpdate,
    RemediationUpdate,
    Verification,
    Override,
}

/// Caller-side request context attached to every audit event, as resolved
/// by the transport layer (reverse-proxy forwarded address and user agent).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// A structured audit event. Append-only; the metadata bag carries the
/// transition-specific details (decision, task id, evidence types, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_id: String,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub action: AuditAction,
    /// Resource kind the event is about; always "flag" for workflow events.
    pub resource_type: String,
    pub resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<MeetingId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        workspace_id: WorkspaceId,
        user_id: UserId,
        action: AuditAction,
        resource_id: impl Into<String>,
        meeting_id: Option<MeetingId>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            workspace_id,
            user_id,
            action,
            resource_type: "flag".to_string(),
            resource_id: resource_id.into(),
            meeting_id,
            metadata: BTreeMap::new(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge the transport-level request context into the metadata bag.
    pub fn with_request_context(mut self, context: &RequestContext) -> Self {
        if let Some(ip) = &context.ip_address {
            self.metadata
                .insert("ipAddress".to_string(), Value::String(ip.clone()));
        }
        if let Some(agent) = &context.user_agent {
            self.metadata
                .insert("userAgent".to_string(), Value::String(agent.clone()));
        }
        self
    }
}

/// The collaborator-facing emitter contract. Called inside the engine's
/// critical section, before any table write is applied, so a failing
/// emitter aborts the whole action.
pub trait AuditEmitter: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Record a batch as one unit. Sinks that can commit atomically should
    /// override this so a mid-batch failure leaves nothing behind.
    fn record_all(&self, events: Vec<AuditEvent>) -> Result<(), AuditError> {
        for event in events {
            self.record(event)?;
        }
        Ok(())
    }
}

/// Filters for querying the in-memory log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub action: Option<AuditAction>,
    pub meeting_id: Option<MeetingId>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Append-only in-memory audit log.
#[derive(Default)]
pub struct AuditLog {
    events: RwLock<Vec<AuditEvent>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events for one resource, oldest first.
    pub fn events_for_resource(&self, resource_id: &str) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self.events.read().map_err(|_| AuditError::Lock)?;
        Ok(events
            .iter()
            .filter(|event| event.resource_id == resource_id)
            .cloned()
            .collect())
    }

    /// Query events with filters, newest first.
    pub fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self.events.read().map_err(|_| AuditError::Lock)?;

        let mut results: Vec<_> = events
            .iter()
            .filter(|event| {
                if let Some(action) = query.action {
                    if event.action != action {
                        return false;
                    }
                }
                if let Some(meeting_id) = &query.meeting_id {
                    if event.meeting_id.as_ref() != Some(meeting_id) {
                        return false;
                    }
                }
                if let Some(after) = query.after {
                    if event.recorded_at < after {
                        return false;
                    }
                }
                if let Some(before) = query.before {
                    if event.recorded_at > before {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        results.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditEmitter for AuditLog {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut events = self.events.write().map_err(|_| AuditError::Lock)?;
        events.push(event);
        Ok(())
    }

    // One lock acquisition, so the batch lands whole or not at all.
    fn record_all(&self, batch: Vec<AuditEvent>) -> Result<(), AuditError> {
        let mut events = self.events.write().map_err(|_| AuditError::Lock)?;
        events.extend(batch);
        Ok(())
    }
}

/// Emitter that forwards events to the tracing pipeline. Useful when the
/// durable audit store lives behind a log shipper.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEmitter;

impl AuditEmitter for TracingEmitter {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            target: "redress::audit",
            event_id = %event.event_id,
            workspace = %event.workspace_id,
            user = %event.user_id,
            action = ?event.action,
            resource = %event.resource_id,
            "audit event"
        );
        Ok(())
    }
}

/// Audit-related errors.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log lock poisoned")]
    Lock,
    #[error("audit sink rejected event: {0}")]
    Sink(String),
}

//! Remediation action items.

use crate::{ResolutionId, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// A unit of remediation work. Created in a policy-determined batch when
/// remediation starts; mutated only by task completion.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: TaskId,
    pub resolution_id: ResolutionId,
    pub title: String,
    pub owner_id: UserId,
    pub due_date: DateTime<Utc>,
    /// Required tasks gate submission for verification.
    pub required: bool,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ActionItem {
    pub fn new(
        resolution_id: ResolutionId,
        title: impl Into<String>,
        owner_id: UserId,
        due_date: DateTime<Utc>,
        required: bool,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            resolution_id,
            title: title.into(),
            owner_id,
            due_date,
            required,
            status: TaskStatus::Pending,
            completion_note: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Mark the task completed, stamping the completion time.
    pub fn complete(&mut self, note: Option<String>) {
        self.status = TaskStatus::Completed;
        self.completion_note = note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_owned);
        self.completed_at = Some(Utc::now());
    }
}

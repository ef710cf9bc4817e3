//! Caller identity as resolved by the external auth layer.

use crate::{UserId, WorkspaceId};
use serde::{Deserialize, Serialize};

/// Workspace role. Only the compliance owner (CCO) may approve, reject,
/// or override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    OwnerCco,
    Member,
}

impl UserRole {
    pub fn is_privileged_reviewer(&self) -> bool {
        matches!(self, UserRole::OwnerCco)
    }
}

/// An authenticated, workspace-scoped, role-resolved caller. Produced by
/// the external auth collaborator; the engine trusts it as given.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub workspace_id: WorkspaceId,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: UserId, workspace_id: WorkspaceId, role: UserRole) -> Self {
        Self {
            user_id,
            workspace_id,
            role,
        }
    }
}

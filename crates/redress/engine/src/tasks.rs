//! Task tracker: action-item bookkeeping over the store tables.

use crate::store::Tables;
use crate::WorkflowError;
use redress_types::{ActionItem, ResolutionId, TaskId};

impl Tables {
    pub(crate) fn insert_tasks(&mut self, tasks: Vec<ActionItem>) {
        for task in tasks {
            self.tasks_by_resolution
                .entry(task.resolution_id.clone())
                .or_default()
                .push(task.id.clone());
            self.tasks.insert(task.id.clone(), task);
        }
    }

    /// Tasks for a resolution in creation order.
    pub(crate) fn tasks_for(&self, resolution_id: &ResolutionId) -> Vec<ActionItem> {
        self.tasks_by_resolution
            .get(resolution_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect()
    }

    /// A task addressed through a flag must belong to that flag's
    /// resolution; a task id from elsewhere is simply not found.
    pub(crate) fn task_in_resolution(
        &self,
        resolution_id: &ResolutionId,
        task_id: &TaskId,
    ) -> Result<&ActionItem, WorkflowError> {
        self.tasks
            .get(task_id)
            .filter(|task| &task.resolution_id == resolution_id)
            .ok_or_else(|| WorkflowError::NotFound("Task not found".to_string()))
    }

    /// The submission gate: every required task must be completed.
    pub(crate) fn all_required_complete(&self, resolution_id: &ResolutionId) -> bool {
        self.tasks_by_resolution
            .get(resolution_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tasks.get(id))
            .filter(|task| task.required)
            .all(ActionItem::is_complete)
    }
}

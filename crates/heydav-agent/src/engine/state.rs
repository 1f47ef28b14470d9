use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use heydav_core::{IgnoreRwLock as _, TaskId, TaskStatus};
use tokio_util::sync::CancellationToken;

/// Live bookkeeping for one task inside the engine.
#[derive(Debug, Clone)]
pub struct TaskExecutionState {
    /// Task concerned
    pub task_id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// When the engine accepted the task
    pub started_at: DateTime<Utc>,
    /// Last status change
    pub last_update: DateTime<Utc>,
    /// Message attached to the last change
    pub last_message: String,
    cancellation: CancellationToken,
}

/// Registry of tasks currently owned by the engine.
#[derive(Debug, Default)]
pub struct ActiveTasks {
    states: RwLock<HashMap<TaskId, TaskExecutionState>>,
}

impl ActiveTasks {
    /// Registers a task as queued.
    pub fn register(&self, task_id: TaskId, cancellation: CancellationToken) {
        let now = Utc::now();
        self.states.write_ignore_poison().insert(
            task_id,
            TaskExecutionState {
                task_id,
                status: TaskStatus::Queued,
                started_at: now,
                last_update: now,
                last_message: "Task queued".to_owned(),
                cancellation,
            },
        );
    }

    /// Moves a task to `status` unless it was already cancelled.
    pub fn transition(&self, task_id: TaskId, status: TaskStatus, message: &str) {
        let mut states = self.states.write_ignore_poison();
        if let Some(state) = states.get_mut(&task_id)
            && state.status != TaskStatus::Cancelled
        {
            state.status = status;
            state.last_update = Utc::now();
            message.clone_into(&mut state.last_message);
        }
    }

    /// Marks a task cancelled and triggers its token. Returns whether it was active.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let mut states = self.states.write_ignore_poison();
        let Some(state) = states.get_mut(&task_id) else {
            return false;
        };
        state.status = TaskStatus::Cancelled;
        state.last_update = Utc::now();
        "Cancellation requested".clone_into(&mut state.last_message);
        state.cancellation.cancel();
        true
    }

    /// Removes a finished task.
    pub fn remove(&self, task_id: TaskId) -> Option<TaskExecutionState> {
        self.states.write_ignore_poison().remove(&task_id)
    }

    /// Current status of a task, if active.
    pub fn status(&self, task_id: TaskId) -> Option<TaskStatus> {
        self.states
            .read_ignore_poison()
            .get(&task_id)
            .map(|state| state.status)
    }

    /// Snapshot of every active task.
    pub fn snapshot(&self) -> Vec<TaskExecutionState> {
        self.states.read_ignore_poison().values().cloned().collect()
    }

    /// Number of active tasks.
    pub fn len(&self) -> usize {
        self.states.read_ignore_poison().len()
    }

    /// Whether no task is active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

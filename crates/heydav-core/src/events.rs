//! Task lifecycle events.
//! Observers subscribe to an [`EventChannel`] to follow progress.

use tokio::sync::broadcast;
use tracing::trace;

use crate::task::{TaskExecutionResult, TaskId, TaskStatus};

/// Event published while tasks move through the engine.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// A task changed status
    Progress {
        /// Task concerned
        task_id: TaskId,
        /// New status
        status: TaskStatus,
        /// Progress derived from the status
        progress_percentage: u8,
        /// Short description of the transition
        message: String,
    },
    /// A task finished (in any terminal status)
    Completed {
        /// Task concerned
        task_id: TaskId,
        /// Final result
        result: Box<TaskExecutionResult>,
    },
}

impl TaskEvent {
    /// Task the event belongs to.
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Progress { task_id, .. } | Self::Completed { task_id, .. } => *task_id,
        }
    }
}

/// Broadcast channel for task events.
#[derive(Clone, Debug)]
pub struct EventChannel {
    sender: broadcast::Sender<TaskEvent>,
}

impl EventChannel {
    /// Creates a channel buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    /// Sends an event; having no subscriber is not an error.
    pub fn send(&self, event: TaskEvent) {
        if let Err(error) = self.sender.send(event) {
            trace!("No subscriber for task event: {:?}", error.0.task_id());
        }
    }

    /// Sends a progress event for `status`.
    pub fn progress(&self, task_id: TaskId, status: TaskStatus, message: impl Into<String>) {
        self.send(TaskEvent::Progress {
            task_id,
            status,
            progress_percentage: status.progress_percentage(),
            message: message.into(),
        });
    }

    /// Sends a completion event.
    pub fn completed(&self, result: TaskExecutionResult) {
        self.send(TaskEvent::Completed {
            task_id: result.task_id,
            result: Box::new(result),
        });
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

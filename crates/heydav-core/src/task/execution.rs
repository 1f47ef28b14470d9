//! Execution requests, per-task results and lifecycle statuses.

use core::fmt::{Display, Formatter, Result as FmtResult};
use core::time::Duration;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::strategy::ExecutionMode;
use super::types::{TaskBreakdown, TaskId};
use crate::command::{CommandRequest, CommandResult};
use crate::sync::IgnoreRwLock as _;

/// Lifecycle status of one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Known but not yet submitted
    #[default]
    Pending,
    /// Waiting for an admission permit
    Queued,
    /// Inside a processor call
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Stopped by a cancellation request
    Cancelled,
    /// Reserved
    Retrying,
    /// Reserved
    Paused,
}

impl TaskStatus {
    /// Progress shown to observers for this status.
    pub fn progress_percentage(self) -> u8 {
        match self {
            Self::Pending | Self::Paused => 0,
            Self::Queued | Self::Retrying => 10,
            Self::Running => 50,
            Self::Completed | Self::Failed | Self::Cancelled => 100,
        }
    }

    /// Whether no further transitions happen from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        write!(formatter, "{self:?}")
    }
}

/// Key/value store shared by every request of one batch.
///
/// Cloning the handle shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct SharedData {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl SharedData {
    /// Reads one entry.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read_ignore_poison().get(key).cloned()
    }

    /// Writes one entry, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.write_ignore_poison().insert(key.into(), value)
    }

    /// Copies the current contents.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.read_ignore_poison().clone()
    }
}

/// Environment a task executes in.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Data shared across the batch
    pub shared_data: SharedData,
    /// Resources available to processors
    pub resources: HashMap<String, Value>,
    /// Per-batch configuration values
    pub config: HashMap<String, Value>,
}

/// A task submitted to the execution engine.
#[derive(Debug, Clone)]
pub struct TaskExecutionRequest {
    /// Same as the task id
    pub id: TaskId,
    /// What to run
    pub task: TaskBreakdown,
    /// Command that spawned the task
    pub command: CommandRequest,
    /// Execution environment
    pub context: ExecutionContext,
    /// Cooperative cancellation signal
    pub cancellation: CancellationToken,
    /// Deadline for the processor call
    pub timeout: Option<Duration>,
}

impl TaskExecutionRequest {
    /// Builds a request for `task`; the command is the task description.
    pub fn for_task(task: TaskBreakdown, source: impl Into<String>) -> Self {
        let command = CommandRequest::new(task.description.clone(), source);
        Self {
            id: task.id,
            task,
            command,
            context: ExecutionContext::default(),
            cancellation: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Replaces the originating command.
    #[must_use]
    pub fn with_command(mut self, command: CommandRequest) -> Self {
        self.command = command;
        self
    }

    /// Replaces the execution context.
    #[must_use]
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Uses an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Sets the deadline for the processor call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecutionResult {
    /// Task this result belongs to
    pub task_id: TaskId,
    /// Whether the task succeeded
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    /// Structured payload from the processor
    pub data: Option<Value>,
    /// Raw processor results
    pub sub_results: Vec<CommandResult>,
    /// Final status
    pub status: TaskStatus,
    /// Time from submission to completion
    pub execution_time: Duration,
    /// Submission time
    pub started_at: DateTime<Utc>,
    /// Completion time
    pub ended_at: DateTime<Utc>,
    /// Processor that ran the task
    pub processor_used: Option<String>,
    /// Extra key/value information
    pub metadata: HashMap<String, Value>,
    /// Error messages
    pub errors: Vec<String>,
    /// Warning messages
    pub warnings: Vec<String>,
    /// Per-task measurements
    pub metrics: HashMap<String, f64>,
}

impl TaskExecutionResult {
    /// Creates an empty result with the given status, stamped now.
    pub fn new(task_id: TaskId, status: TaskStatus) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            success: status == TaskStatus::Completed,
            message: String::default(),
            data: None,
            sub_results: Vec::default(),
            status,
            execution_time: Duration::ZERO,
            started_at: now,
            ended_at: now,
            processor_used: None,
            metadata: HashMap::default(),
            errors: Vec::default(),
            warnings: Vec::default(),
            metrics: HashMap::default(),
        }
    }

    /// Creates a cancelled result.
    pub fn cancelled(task_id: TaskId) -> Self {
        let mut result = Self::new(task_id, TaskStatus::Cancelled);
        result.message = "Task was cancelled".to_owned();
        result
    }

    /// Creates a failed result carrying `error`.
    pub fn failed(task_id: TaskId, error: impl Into<String>) -> Self {
        let error = error.into();
        let mut result = Self::new(task_id, TaskStatus::Failed);
        result.message = format!("Task execution failed: {error}");
        result.errors.push(error);
        result
    }
}

/// Outcome of a whole batch.
///
/// `results` always holds every per-task outcome produced, even when the
/// batch as a whole failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExecutionResult {
    /// Identifier of this batch
    pub batch_id: TaskId,
    /// Mode the batch actually ran in
    pub mode: ExecutionMode,
    /// Whether every task succeeded
    pub success: bool,
    /// Summary message
    pub message: String,
    /// Per-task outcomes
    pub results: Vec<TaskExecutionResult>,
    /// Wall-clock time of the batch
    pub execution_time: Duration,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub ended_at: DateTime<Utc>,
}

impl BatchExecutionResult {
    /// Number of failed or cancelled tasks.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|result| !result.success).count()
    }
}

use core::fmt::{Display, Formatter, Result as FmtResult};
use core::time::Duration;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::TaskBreakdown;

/// How a batch of tasks is scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One at a time, in list order
    #[default]
    Sequential,
    /// All at once under a parallelism cap
    Parallel,
    /// Dependency waves, each wave in parallel
    Hybrid,
    /// Fixed-size chunks with a pause between chunks
    Batch,
    /// Consumed one by one as requests arrive
    Streaming,
}

impl Display for ExecutionMode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Sequential => "Sequential",
            Self::Parallel => "Parallel",
            Self::Hybrid => "Hybrid",
            Self::Batch => "Batch",
            Self::Streaming => "Streaming",
        };
        formatter.write_str(name)
    }
}

/// When a failed task stops the rest of an ordered batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FailFastPolicy {
    /// Keep going after failures
    #[default]
    Disabled,
    /// Stop after any failure
    AnyFailure,
    /// Stop when the failed task is critical: priority above the threshold, or a delete
    Critical {
        /// Priorities strictly above this are critical
        priority_threshold: i32,
    },
}

impl FailFastPolicy {
    /// Whether a failure of `task` should stop the batch.
    pub fn stops_on(self, task: &TaskBreakdown) -> bool {
        match self {
            Self::Disabled => false,
            Self::AnyFailure => true,
            Self::Critical { priority_threshold } => {
                task.priority > priority_threshold || task.intent.is_destructive()
            }
        }
    }
}

/// Knobs for ordered execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfiguration {
    /// Failure handling for ordered modes
    pub fail_fast: FailFastPolicy,
    /// Pause between consecutive sequential tasks
    pub inter_task_delay: Option<Duration>,
}

/// How to execute a set of subtasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStrategy {
    /// Scheduling mode
    pub mode: ExecutionMode,
    /// Cap on simultaneously running tasks of this batch
    pub max_parallel_tasks: usize,
    /// Deadline applied to each task
    pub timeout_per_task: Duration,
    /// Whether a human must approve before execution
    pub requires_human_approval: bool,
    /// Named checks to run before execution
    pub pre_execution_checks: Vec<String>,
    /// Free-form resource limits
    pub resource_limits: HashMap<String, Value>,
    /// Ordered-execution settings
    pub configuration: ExecutionConfiguration,
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            max_parallel_tasks: 1,
            timeout_per_task: Duration::from_secs(300),
            requires_human_approval: false,
            pre_execution_checks: Vec::default(),
            resource_limits: HashMap::default(),
            configuration: ExecutionConfiguration::default(),
        }
    }
}

impl ExecutionStrategy {
    /// Creates a strategy for `mode` with default limits.
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Sets the parallelism cap.
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel_tasks: usize) -> Self {
        self.max_parallel_tasks = max_parallel_tasks;
        self
    }

    /// Sets the per-task deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout_per_task: Duration) -> Self {
        self.timeout_per_task = timeout_per_task;
        self
    }

    /// Sets the fail-fast policy.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: FailFastPolicy) -> Self {
        self.configuration.fail_fast = fail_fast;
        self
    }

    /// Appends a named pre-execution check.
    #[must_use]
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.pre_execution_checks.push(check.into());
        self
    }

    /// Parallelism cap, never below one.
    pub fn effective_parallelism(&self) -> usize {
        self.max_parallel_tasks.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::Intent;

    #[test]
    fn test_fail_fast_policies() {
        let routine = TaskBreakdown::new("list notes", Intent::Read).with_priority(2);
        let urgent = TaskBreakdown::new("list notes", Intent::Read).with_priority(6);
        let destructive = TaskBreakdown::new("delete notes", Intent::Delete).with_priority(1);

        assert!(!FailFastPolicy::Disabled.stops_on(&urgent));
        assert!(FailFastPolicy::AnyFailure.stops_on(&routine));

        let critical = FailFastPolicy::Critical {
            priority_threshold: 5,
        };
        assert!(!critical.stops_on(&routine));
        assert!(critical.stops_on(&urgent));
        assert!(critical.stops_on(&destructive));
    }

    #[test]
    fn test_effective_parallelism_floor() {
        let strategy = ExecutionStrategy::new(ExecutionMode::Parallel).with_max_parallel(0);
        assert_eq!(strategy.effective_parallelism(), 1);
    }
}

use core::time::Duration;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::execution::TaskExecutionResult;

/// Running totals kept by the execution engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Tasks that reached a processor and finished
    pub total_tasks_executed: u64,
    /// Tasks that completed successfully
    pub successful_tasks: u64,
    /// Tasks that failed
    pub failed_tasks: u64,
    /// Tasks that were cancelled
    pub cancelled_tasks: u64,
    /// Sum of execution times of finished tasks
    pub total_execution_time: Duration,
    /// `total_execution_time / total_tasks_executed`
    pub average_execution_time: Duration,
    /// Highest number of simultaneously active tasks seen by the sampler
    pub concurrent_tasks_peak: usize,
    /// Finished tasks per processor
    pub processor_usage: HashMap<String, u64>,
    /// Incremental average execution time per processor
    pub processor_performance: HashMap<String, Duration>,
}

impl ExecutionMetrics {
    /// Folds a finished (completed or failed) task into the totals.
    pub fn record(&mut self, result: &TaskExecutionResult) {
        self.total_tasks_executed += 1;
        if result.success {
            self.successful_tasks += 1;
        } else {
            self.failed_tasks += 1;
        }

        self.total_execution_time += result.execution_time;
        let executed = u32::try_from(self.total_tasks_executed).unwrap_or(u32::MAX);
        self.average_execution_time = self.total_execution_time / executed;

        if let Some(processor) = &result.processor_used {
            let usage = self.processor_usage.entry(processor.clone()).or_insert(0);
            *usage += 1;
            let count = u128::from(*usage);
            let previous = self
                .processor_performance
                .get(processor)
                .map_or(0, Duration::as_nanos);
            let average = (previous * (count - 1) + result.execution_time.as_nanos()) / count;
            let average = Duration::from_nanos(u64::try_from(average).unwrap_or(u64::MAX));
            self.processor_performance.insert(processor.clone(), average);
        }
    }

    /// Counts a cancelled task; success and failure totals are untouched.
    pub fn record_cancelled(&mut self) {
        self.cancelled_tasks += 1;
    }

    /// Updates the concurrency peak with a sampled active-task count.
    pub fn observe_concurrency(&mut self, active: usize) {
        self.concurrent_tasks_peak = self.concurrent_tasks_peak.max(active);
    }
}

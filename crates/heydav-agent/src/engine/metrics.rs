use core::time::Duration;
use std::sync::{Mutex, Weak};

use heydav_core::{ExecutionMetrics, IgnoreLock as _, TaskExecutionResult};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::trace;

use super::state::ActiveTasks;

/// Engine metrics behind a single lock.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    metrics: Mutex<ExecutionMetrics>,
}

impl MetricsRecorder {
    /// Records a completed or failed task.
    pub fn record(&self, result: &TaskExecutionResult) {
        self.metrics.lock_ignore_poison().record(result);
    }

    /// Records a cancelled task.
    pub fn record_cancelled(&self) {
        self.metrics.lock_ignore_poison().record_cancelled();
    }

    /// Records a sampled active-task count.
    pub fn sample(&self, active: usize) {
        self.metrics.lock_ignore_poison().observe_concurrency(active);
    }

    /// Copy of the current totals.
    pub fn snapshot(&self) -> ExecutionMetrics {
        self.metrics.lock_ignore_poison().clone()
    }
}

/// Spawns the periodic concurrency sampler.
///
/// The sampler stops on its own once the engine state is gone; the engine
/// also aborts it on drop.
pub fn spawn_sampler(
    active: Weak<ActiveTasks>,
    metrics: Weak<MetricsRecorder>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let (Some(active), Some(metrics)) = (active.upgrade(), metrics.upgrade()) else {
                break;
            };
            let count = active.len();
            metrics.sample(count);
            trace!("Sampled {} active tasks", count);
        }
    })
}

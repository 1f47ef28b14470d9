//! Task execution engine.
//!
//! [`TaskExecutionEngine`] runs [`TaskExecutionRequest`]s one at a time or in
//! batches. Every task passes through the engine-wide admission semaphore;
//! batch strategies add their own parallelism cap on top. Progress and
//! completion are published as [`TaskEvent`]s.

use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use heydav_core::{
    BatchExecutionResult, EngineConfig, Error, ExecutionMetrics, ExecutionMode,
    ExecutionStrategy, ProcessorFactory, Result, TaskDependencyGraph, TaskEvent,
    TaskExecutionRequest, TaskExecutionResult, TaskId, TaskStatus,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Wave graph over batch tasks
pub mod graph;
/// Metrics recorder and concurrency sampler
pub mod metrics;
/// Processor routing
pub mod routing;
/// Single-task execution
pub mod runner;
/// Active-task registry
pub mod state;
/// Batch strategies
pub mod strategies;

pub use runner::TaskRunner;
pub use strategies::{StrategyExecutor, StrategyOutcome, StrategyTable};

/// Everything a strategy needs to know about one batch.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// Strategy requested for the batch
    pub strategy: ExecutionStrategy,
    /// Dependency graph, if the caller has one
    pub graph: Option<TaskDependencyGraph>,
    /// Pause between chunks in batch mode
    pub batch_pause: Duration,
    /// Deadline applied to requests that carry none
    pub task_timeout: Option<Duration>,
}

impl BatchPlan {
    /// Fills in the default deadline.
    #[must_use]
    pub fn prepare(&self, mut request: TaskExecutionRequest) -> TaskExecutionRequest {
        if request.timeout.is_none() {
            request.timeout = self.task_timeout;
        }
        request
    }
}

/// Executes tasks on behalf of the orchestrator.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Runs a single task.
    async fn execute_task(&self, request: TaskExecutionRequest) -> TaskExecutionResult;

    /// Runs a batch under `strategy`, using `graph` for dependency waves.
    async fn execute_tasks(
        &self,
        requests: Vec<TaskExecutionRequest>,
        strategy: &ExecutionStrategy,
        graph: Option<&TaskDependencyGraph>,
    ) -> BatchExecutionResult;

    /// Runs requests as they arrive, yielding results in the same order.
    fn stream_tasks(
        &self,
        requests: mpsc::Receiver<TaskExecutionRequest>,
        strategy: &ExecutionStrategy,
    ) -> mpsc::Receiver<TaskExecutionResult>;

    /// Status of a task; `Pending` when the engine does not know it.
    fn task_status(&self, task_id: TaskId) -> TaskStatus;

    /// Status of every task currently owned by the engine.
    fn active_statuses(&self) -> Vec<(TaskId, TaskStatus)>;

    /// Cancels an active task. Returns whether the task was active.
    fn cancel_task(&self, task_id: TaskId) -> bool;

    /// Re-runs a finished task.
    ///
    /// # Errors
    /// Returns an error when the task cannot be retried.
    async fn retry_task(&self, task_id: TaskId) -> Result<TaskExecutionResult>;

    /// Snapshot of the execution metrics.
    fn metrics(&self) -> ExecutionMetrics;

    /// Subscribes to task events.
    fn subscribe(&self) -> broadcast::Receiver<TaskEvent>;
}

/// Default [`TaskExecutor`] backed by a processor factory.
pub struct TaskExecutionEngine {
    runner: TaskRunner,
    strategies: StrategyTable,
    config: EngineConfig,
    sampler: JoinHandle<()>,
}

impl TaskExecutionEngine {
    /// Creates an engine and starts its concurrency sampler.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new(processors: Arc<dyn ProcessorFactory>, config: EngineConfig) -> Self {
        let runner = TaskRunner::new(processors, &config);
        let sampler = metrics::spawn_sampler(
            Arc::downgrade(&runner.active),
            Arc::downgrade(&runner.metrics),
            config.metrics_interval(),
        );
        info!(
            "Task execution engine started (max {} concurrent tasks)",
            config.max_concurrent_tasks
        );

        Self {
            runner,
            strategies: StrategyTable::default(),
            config,
            sampler,
        }
    }

    /// Replaces the executor used for `mode`.
    #[must_use]
    pub fn with_strategy(mut self, mode: ExecutionMode, executor: Arc<dyn StrategyExecutor>) -> Self {
        self.strategies.register(mode, executor);
        self
    }

    /// Runner shared by the strategies.
    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn plan(&self, strategy: &ExecutionStrategy, graph: Option<&TaskDependencyGraph>) -> BatchPlan {
        BatchPlan {
            strategy: strategy.clone(),
            graph: graph.cloned(),
            batch_pause: self.config.batch_pause(),
            task_timeout: self
                .config
                .enforce_task_timeout
                .then_some(strategy.timeout_per_task),
        }
    }
}

impl Drop for TaskExecutionEngine {
    fn drop(&mut self) {
        self.sampler.abort();
    }
}

#[async_trait]
impl TaskExecutor for TaskExecutionEngine {
    async fn execute_task(&self, request: TaskExecutionRequest) -> TaskExecutionResult {
        self.runner.run(&request, None).await
    }

    async fn execute_tasks(
        &self,
        requests: Vec<TaskExecutionRequest>,
        strategy: &ExecutionStrategy,
        graph: Option<&TaskDependencyGraph>,
    ) -> BatchExecutionResult {
        let started = Instant::now();
        let started_at = Utc::now();
        let submitted = requests.len();
        let plan = self.plan(strategy, graph);

        let executor = self.strategies.get(strategy.mode).unwrap_or_else(|| {
            warn!("No executor registered for {} mode, running sequentially", strategy.mode);
            let fallback: Arc<dyn StrategyExecutor> = Arc::new(strategies::SequentialExecution);
            fallback
        });
        info!("Executing {} task(s) in {} mode", submitted, strategy.mode);

        let outcome = executor.execute(&self.runner, requests, &plan).await;
        let succeeded = outcome.results.iter().filter(|result| result.success).count();
        let success = succeeded == outcome.results.len();
        let message = if success {
            format!(
                "Batch execution completed successfully. {} tasks executed.",
                outcome.results.len()
            )
        } else {
            format!(
                "Batch execution completed with failures. {}/{} tasks succeeded.",
                succeeded, submitted
            )
        };
        info!("{}", message);

        BatchExecutionResult {
            batch_id: TaskId::default(),
            mode: outcome.mode,
            success,
            message,
            results: outcome.results,
            execution_time: started.elapsed(),
            started_at,
            ended_at: Utc::now(),
        }
    }

    fn stream_tasks(
        &self,
        requests: mpsc::Receiver<TaskExecutionRequest>,
        strategy: &ExecutionStrategy,
    ) -> mpsc::Receiver<TaskExecutionResult> {
        strategies::spawn_stream(self.runner.clone(), requests, self.plan(strategy, None))
    }

    fn task_status(&self, task_id: TaskId) -> TaskStatus {
        self.runner
            .active
            .status(task_id)
            .unwrap_or(TaskStatus::Pending)
    }

    fn active_statuses(&self) -> Vec<(TaskId, TaskStatus)> {
        self.runner
            .active
            .snapshot()
            .into_iter()
            .map(|state| (state.task_id, state.status))
            .collect()
    }

    fn cancel_task(&self, task_id: TaskId) -> bool {
        let cancelled = self.runner.active.cancel(task_id);
        if cancelled {
            info!("Cancellation requested for task {}", task_id);
        }
        cancelled
    }

    async fn retry_task(&self, task_id: TaskId) -> Result<TaskExecutionResult> {
        Err(Error::RetryUnsupported(task_id))
    }

    fn metrics(&self) -> ExecutionMetrics {
        self.runner.metrics.snapshot()
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.runner.events.subscribe()
    }
}

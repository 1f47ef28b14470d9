//! Batch scheduling strategies.

use core::mem;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use heydav_core::{
    ExecutionMode, TaskBreakdown, TaskExecutionRequest, TaskExecutionResult, TaskId,
};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::BatchPlan;
use super::graph::TaskGraph;
use super::runner::TaskRunner;

/// Buffer between the streaming consumer and its reader.
const STREAM_BUFFER: usize = 32;

/// Results of one strategy run.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// Mode that actually ran; differs from the request when a strategy degrades
    pub mode: ExecutionMode,
    /// Per-task results
    pub results: Vec<TaskExecutionResult>,
}

/// Schedules a batch of requests on a [`TaskRunner`].
#[async_trait]
pub trait StrategyExecutor: Send + Sync {
    /// Runs `requests` to completion (or until fail-fast stops the batch).
    async fn execute(
        &self,
        runner: &TaskRunner,
        requests: Vec<TaskExecutionRequest>,
        plan: &BatchPlan,
    ) -> StrategyOutcome;
}

/// One task at a time, in list order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecution;

#[async_trait]
impl StrategyExecutor for SequentialExecution {
    async fn execute(
        &self,
        runner: &TaskRunner,
        requests: Vec<TaskExecutionRequest>,
        plan: &BatchPlan,
    ) -> StrategyOutcome {
        let policy = plan.strategy.configuration.fail_fast;
        let delay = plan.strategy.configuration.inter_task_delay;
        let total = requests.len();
        let mut results = Vec::with_capacity(total);

        for (index, request) in requests.into_iter().enumerate() {
            if index > 0
                && let Some(pause) = delay
            {
                sleep(pause).await;
            }

            let prepared = plan.prepare(request);
            let result = runner.run(&prepared, None).await;
            let stop = !result.success && policy.stops_on(&prepared.task);
            results.push(result);

            if stop {
                warn!(
                    "Fail-fast: task {} failed, skipping {} remaining task(s)",
                    prepared.id,
                    total - index - 1
                );
                break;
            }
        }

        StrategyOutcome {
            mode: ExecutionMode::Sequential,
            results,
        }
    }
}

/// Everything at once under a `max_parallel_tasks` cap.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelExecution;

#[async_trait]
impl StrategyExecutor for ParallelExecution {
    async fn execute(
        &self,
        runner: &TaskRunner,
        requests: Vec<TaskExecutionRequest>,
        plan: &BatchPlan,
    ) -> StrategyOutcome {
        StrategyOutcome {
            mode: ExecutionMode::Parallel,
            results: run_parallel(runner, requests, plan).await,
        }
    }
}

/// Dependency waves, each wave run in parallel.
#[derive(Debug, Default, Clone, Copy)]
pub struct HybridExecution;

#[async_trait]
impl StrategyExecutor for HybridExecution {
    async fn execute(
        &self,
        runner: &TaskRunner,
        requests: Vec<TaskExecutionRequest>,
        plan: &BatchPlan,
    ) -> StrategyOutcome {
        let Some(dependencies) = plan
            .graph
            .as_ref()
            .filter(|graph| !graph.has_circular_dependency)
        else {
            warn!("Hybrid execution needs an acyclic dependency graph, running in parallel");
            return ParallelExecution.execute(runner, requests, plan).await;
        };

        let ids: Vec<TaskId> = requests.iter().map(|request| request.id).collect();
        let graph = TaskGraph::from_dependencies(&ids, &dependencies.dependencies);
        if graph.has_cycles() {
            warn!("Dependency cycle among batch tasks, running in parallel");
            return ParallelExecution.execute(runner, requests, plan).await;
        }

        let policy = plan.strategy.configuration.fail_fast;
        let mut pending: HashMap<TaskId, TaskExecutionRequest> = requests
            .into_iter()
            .map(|request| (request.id, request))
            .collect();
        let mut completed = HashSet::new();
        let mut results = Vec::with_capacity(pending.len());

        loop {
            let wave: Vec<TaskExecutionRequest> = graph
                .ready_tasks(&completed)
                .into_iter()
                .filter_map(|task_id| pending.remove(&task_id))
                .collect();
            if wave.is_empty() {
                break;
            }

            let tasks: HashMap<TaskId, TaskBreakdown> = wave
                .iter()
                .map(|request| (request.id, request.task.clone()))
                .collect();
            debug!("Running wave of {} task(s)", wave.len());

            let wave_results = run_parallel(runner, wave, plan).await;
            completed.extend(tasks.keys().copied());

            let stop = wave_results.iter().any(|result| {
                !result.success
                    && tasks
                        .get(&result.task_id)
                        .is_some_and(|task| policy.stops_on(task))
            });
            results.extend(wave_results);

            if stop {
                warn!(
                    "Fail-fast: critical failure in wave, skipping {} remaining task(s)",
                    pending.len()
                );
                break;
            }
        }

        StrategyOutcome {
            mode: ExecutionMode::Hybrid,
            results,
        }
    }
}

/// Fixed-size chunks with a pause between chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkedExecution;

#[async_trait]
impl StrategyExecutor for ChunkedExecution {
    async fn execute(
        &self,
        runner: &TaskRunner,
        requests: Vec<TaskExecutionRequest>,
        plan: &BatchPlan,
    ) -> StrategyOutcome {
        let size = plan.strategy.effective_parallelism();
        let mut remaining = requests;
        let mut results = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let rest = remaining.split_off(size.min(remaining.len()));
            let chunk = mem::replace(&mut remaining, rest);
            debug!("Running chunk of {} task(s)", chunk.len());
            results.extend(run_parallel(runner, chunk, plan).await);

            if !remaining.is_empty() {
                sleep(plan.batch_pause).await;
            }
        }

        StrategyOutcome {
            mode: ExecutionMode::Batch,
            results,
        }
    }
}

/// Feeds the batch through a channel and consumes it in arrival order.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamingExecution;

#[async_trait]
impl StrategyExecutor for StreamingExecution {
    async fn execute(
        &self,
        runner: &TaskRunner,
        requests: Vec<TaskExecutionRequest>,
        plan: &BatchPlan,
    ) -> StrategyOutcome {
        let (feeder, inbound) = mpsc::channel(requests.len().max(1));
        for request in requests {
            if let Err(rejected) = feeder.try_send(request) {
                warn!("Streaming feeder rejected a request: {}", rejected);
                break;
            }
        }
        drop(feeder);

        let mut outbound = spawn_stream(runner.clone(), inbound, plan.clone());
        let mut results = Vec::new();
        while let Some(result) = outbound.recv().await {
            results.push(result);
        }

        StrategyOutcome {
            mode: ExecutionMode::Streaming,
            results,
        }
    }
}

/// Spawns a consumer that runs requests one by one as they arrive.
///
/// The consumer stops when the inbound channel closes, when the reader drops
/// the returned receiver, or when fail-fast triggers.
pub fn spawn_stream(
    runner: TaskRunner,
    mut requests: mpsc::Receiver<TaskExecutionRequest>,
    plan: BatchPlan,
) -> mpsc::Receiver<TaskExecutionResult> {
    let (sender, receiver) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(async move {
        let policy = plan.strategy.configuration.fail_fast;
        while let Some(request) = requests.recv().await {
            let prepared = plan.prepare(request);
            let result = runner.run(&prepared, None).await;
            let stop = !result.success && policy.stops_on(&prepared.task);

            if sender.send(result).await.is_err() {
                debug!("Stream reader dropped, stopping consumer");
                break;
            }
            if stop {
                warn!("Fail-fast: task {} failed, closing stream", prepared.id);
                break;
            }
        }
    });
    receiver
}

/// Runs `requests` concurrently, at most `effective_parallelism` at a time.
async fn run_parallel(
    runner: &TaskRunner,
    requests: Vec<TaskExecutionRequest>,
    plan: &BatchPlan,
) -> Vec<TaskExecutionResult> {
    let limiter = Arc::new(Semaphore::new(plan.strategy.effective_parallelism()));
    let mut join_set = JoinSet::new();

    for request in requests {
        let runner = runner.clone();
        let limiter = Arc::clone(&limiter);
        let request = plan.prepare(request);
        join_set.spawn(async move { runner.run(&request, Some(limiter)).await });
    }

    let mut results = Vec::with_capacity(join_set.len());
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(join_error) => error!("Parallel task did not finish: {}", join_error),
        }
    }
    results
}

/// Strategy lookup keyed by [`ExecutionMode`].
#[derive(Clone)]
pub struct StrategyTable {
    executors: HashMap<ExecutionMode, Arc<dyn StrategyExecutor>>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        let mut table = Self {
            executors: HashMap::new(),
        };
        table.register(ExecutionMode::Sequential, Arc::new(SequentialExecution));
        table.register(ExecutionMode::Parallel, Arc::new(ParallelExecution));
        table.register(ExecutionMode::Hybrid, Arc::new(HybridExecution));
        table.register(ExecutionMode::Batch, Arc::new(ChunkedExecution));
        table.register(ExecutionMode::Streaming, Arc::new(StreamingExecution));
        table
    }
}

impl StrategyTable {
    /// Registers (or replaces) the executor for `mode`.
    pub fn register(&mut self, mode: ExecutionMode, executor: Arc<dyn StrategyExecutor>) {
        self.executors.insert(mode, executor);
    }

    /// Executor for `mode`.
    pub fn get(&self, mode: ExecutionMode) -> Option<Arc<dyn StrategyExecutor>> {
        self.executors.get(&mode).map(Arc::clone)
    }
}

//! End-to-end behavior of the task execution engine.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::print_stdout,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

mod common;

use core::time::Duration;
use std::collections::HashMap;
use std::sync::Arc;

use common::{CountingProcessor, ErroringProcessor, PanickingProcessor, registry, request};
use heydav_agent::{TaskExecutionEngine, TaskExecutor as _};
use heydav_core::{
    CommandProcessor, EngineConfig, Error, ExecutionMode, ExecutionStrategy, FailFastPolicy,
    TaskDependencyGraph, TaskEvent, TaskExecutionRequest, TaskId, TaskStatus,
};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

fn engine_for(processor: &Arc<CountingProcessor>, config: EngineConfig) -> TaskExecutionEngine {
    let shared: Arc<dyn CommandProcessor> = Arc::<CountingProcessor>::clone(processor);
    TaskExecutionEngine::new(registry(vec![shared]), config)
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        batch_pause_ms: 10,
        ..EngineConfig::default()
    }
}

fn requests(descriptions: &[&str]) -> Vec<TaskExecutionRequest> {
    descriptions.iter().map(|description| request(description)).collect()
}

async fn wait_for_status(engine: &TaskExecutionEngine, task_id: TaskId, status: TaskStatus) {
    for _ in 0..200 {
        if engine.task_status(task_id) == status {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} never reached {status}");
}

#[tokio::test]
async fn test_sequential_fail_fast_stops_after_failure() {
    let processor = CountingProcessor::new("general", Duration::from_millis(5));
    let engine = engine_for(&processor, fast_config());
    let strategy =
        ExecutionStrategy::new(ExecutionMode::Sequential).with_fail_fast(FailFastPolicy::AnyFailure);

    let batch = engine
        .execute_tasks(
            requests(&["first step", "second step will fail", "third step"]),
            &strategy,
            None,
        )
        .await;

    assert_eq!(batch.results.len(), 2);
    assert_eq!(processor.calls(), 2);
    assert!(!batch.success);
    assert!(batch.results[0].success);
    assert_eq!(batch.results[1].status, TaskStatus::Failed);
    assert_eq!(
        batch.message,
        "Batch execution completed with failures. 1/3 tasks succeeded."
    );
}

#[tokio::test]
async fn test_sequential_without_fail_fast_runs_everything_in_order() {
    let processor = CountingProcessor::new("general", Duration::from_millis(1));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Sequential);

    let batch = engine
        .execute_tasks(requests(&["one", "two fail", "three"]), &strategy, None)
        .await;

    assert_eq!(batch.results.len(), 3);
    assert_eq!(processor.seen(), vec!["one", "two fail", "three"]);
    assert_eq!(batch.failure_count(), 1);
}

#[tokio::test]
async fn test_parallel_respects_max_parallel_tasks() {
    let processor = CountingProcessor::new("general", Duration::from_millis(20));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Parallel).with_max_parallel(2);

    let descriptions: Vec<String> = (0..8).map(|index| format!("task {index}")).collect();
    let batch = engine
        .execute_tasks(
            descriptions.iter().map(|description| request(description)).collect(),
            &strategy,
            None,
        )
        .await;

    assert!(batch.success);
    assert_eq!(batch.results.len(), 8);
    assert_eq!(batch.mode, ExecutionMode::Parallel);
    assert!(processor.max_concurrency() <= 2);
    assert!(processor.max_concurrency() >= 1);
}

#[tokio::test]
async fn test_global_admission_caps_parallel_strategy() {
    let processor = CountingProcessor::new("general", Duration::from_millis(20));
    let config = EngineConfig {
        max_concurrent_tasks: 1,
        ..fast_config()
    };
    let engine = engine_for(&processor, config);
    let strategy = ExecutionStrategy::new(ExecutionMode::Parallel).with_max_parallel(4);

    let batch = engine
        .execute_tasks(requests(&["a", "b", "c", "d"]), &strategy, None)
        .await;

    assert_eq!(batch.results.len(), 4);
    assert_eq!(processor.max_concurrency(), 1);
}

#[tokio::test]
async fn test_metrics_after_seven_successes_and_three_failures() {
    let processor = CountingProcessor::new("general", Duration::from_millis(2));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Parallel).with_max_parallel(5);

    let mut descriptions: Vec<String> = (0..7).map(|index| format!("good {index}")).collect();
    descriptions.extend((0..3).map(|index| format!("fail {index}")));
    let batch = engine
        .execute_tasks(
            descriptions.iter().map(|description| request(description)).collect(),
            &strategy,
            None,
        )
        .await;
    assert_eq!(batch.results.len(), 10);

    let metrics = engine.metrics();
    assert_eq!(metrics.total_tasks_executed, 10);
    assert_eq!(metrics.successful_tasks, 7);
    assert_eq!(metrics.failed_tasks, 3);
    assert_eq!(metrics.cancelled_tasks, 0);
    assert_eq!(
        metrics.average_execution_time,
        metrics.total_execution_time / 10
    );
    assert_eq!(metrics.processor_usage.get("general"), Some(&10));
}

#[tokio::test]
async fn test_batch_mode_runs_in_chunks() {
    let processor = CountingProcessor::new("general", Duration::from_millis(5));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Batch).with_max_parallel(2);

    let batch = engine
        .execute_tasks(requests(&["a", "b", "c", "d", "e"]), &strategy, None)
        .await;

    assert_eq!(batch.mode, ExecutionMode::Batch);
    assert_eq!(batch.results.len(), 5);
    assert_eq!(processor.calls(), 5);
    assert!(processor.max_concurrency() <= 2);
}

#[tokio::test]
async fn test_hybrid_runs_dependency_waves_in_order() {
    let processor = CountingProcessor::new("general", Duration::from_millis(5));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Hybrid).with_max_parallel(3);

    let batch_requests = requests(&["collect notes", "draft summary", "review summary"]);
    let ids: Vec<TaskId> = batch_requests.iter().map(|each| each.id).collect();
    let graph = TaskDependencyGraph {
        dependencies: HashMap::from([(ids[1], vec![ids[0]]), (ids[2], vec![ids[1]])]),
        ..TaskDependencyGraph::default()
    };

    // Submitted in reverse so list order cannot explain the result.
    let reversed: Vec<TaskExecutionRequest> = batch_requests.into_iter().rev().collect();
    let batch = engine.execute_tasks(reversed, &strategy, Some(&graph)).await;

    assert_eq!(batch.mode, ExecutionMode::Hybrid);
    assert!(batch.success);
    assert_eq!(
        processor.seen(),
        vec!["collect notes", "draft summary", "review summary"]
    );
    assert_eq!(processor.max_concurrency(), 1);
}

#[tokio::test]
async fn test_hybrid_runs_independent_tasks_of_a_wave_together() {
    let processor = CountingProcessor::new("general", Duration::from_millis(20));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Hybrid).with_max_parallel(3);

    let batch_requests = requests(&["book flight", "book hotel", "share itinerary"]);
    let ids: Vec<TaskId> = batch_requests.iter().map(|each| each.id).collect();
    let graph = TaskDependencyGraph {
        dependencies: HashMap::from([(ids[2], vec![ids[0], ids[1]])]),
        ..TaskDependencyGraph::default()
    };

    let batch = engine
        .execute_tasks(batch_requests, &strategy, Some(&graph))
        .await;

    assert_eq!(batch.results.len(), 3);
    assert_eq!(processor.seen()[2], "share itinerary");
    assert_eq!(processor.max_concurrency(), 2);
}

#[tokio::test]
async fn test_hybrid_fail_fast_skips_later_waves() {
    let processor = CountingProcessor::new("general", Duration::from_millis(1));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Hybrid)
        .with_max_parallel(2)
        .with_fail_fast(FailFastPolicy::AnyFailure);

    let batch_requests = requests(&["fail to fetch data", "render chart"]);
    let ids: Vec<TaskId> = batch_requests.iter().map(|each| each.id).collect();
    let graph = TaskDependencyGraph {
        dependencies: HashMap::from([(ids[1], vec![ids[0]])]),
        ..TaskDependencyGraph::default()
    };

    let batch = engine
        .execute_tasks(batch_requests, &strategy, Some(&graph))
        .await;

    assert_eq!(batch.results.len(), 1);
    assert_eq!(processor.calls(), 1);
}

#[tokio::test]
async fn test_hybrid_without_usable_graph_degrades_to_parallel() {
    let processor = CountingProcessor::new("general", Duration::from_millis(1));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Hybrid).with_max_parallel(2);

    let without_graph = engine
        .execute_tasks(requests(&["a", "b"]), &strategy, None)
        .await;
    assert_eq!(without_graph.mode, ExecutionMode::Parallel);
    assert_eq!(without_graph.results.len(), 2);

    let batch_requests = requests(&["c", "d"]);
    let ids: Vec<TaskId> = batch_requests.iter().map(|each| each.id).collect();
    let cyclic = TaskDependencyGraph {
        dependencies: HashMap::from([(ids[0], vec![ids[1]]), (ids[1], vec![ids[0]])]),
        ..TaskDependencyGraph::default()
    };
    let with_cycle = engine
        .execute_tasks(batch_requests, &strategy, Some(&cyclic))
        .await;
    assert_eq!(with_cycle.mode, ExecutionMode::Parallel);
    assert_eq!(with_cycle.results.len(), 2);
}

#[tokio::test]
async fn test_streaming_mode_keeps_arrival_order_and_fail_fast() {
    let processor = CountingProcessor::new("general", Duration::from_millis(1));
    let engine = engine_for(&processor, fast_config());
    let strategy =
        ExecutionStrategy::new(ExecutionMode::Streaming).with_fail_fast(FailFastPolicy::AnyFailure);

    let batch_requests = requests(&["alpha", "beta fail", "gamma"]);
    let ids: Vec<TaskId> = batch_requests.iter().map(|each| each.id).collect();
    let batch = engine.execute_tasks(batch_requests, &strategy, None).await;

    assert_eq!(batch.mode, ExecutionMode::Streaming);
    let result_ids: Vec<TaskId> = batch.results.iter().map(|result| result.task_id).collect();
    assert_eq!(result_ids, ids[..2].to_vec());
}

#[tokio::test]
async fn test_stream_tasks_yields_results_as_requests_arrive() {
    let processor = CountingProcessor::new("general", Duration::from_millis(1));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Streaming);

    let (sender, inbound) = mpsc::channel(4);
    let mut outbound = engine.stream_tasks(inbound, &strategy);

    let batch_requests = requests(&["one", "two", "three"]);
    let ids: Vec<TaskId> = batch_requests.iter().map(|each| each.id).collect();
    for each in batch_requests {
        sender.send(each).await.unwrap();
    }
    drop(sender);

    let mut result_ids = Vec::new();
    while let Some(result) = outbound.recv().await {
        assert!(result.success);
        result_ids.push(result.task_id);
    }
    assert_eq!(result_ids, ids);
}

#[tokio::test]
async fn test_pre_cancelled_request_never_reaches_processor() {
    let processor = CountingProcessor::new("general", Duration::from_millis(1));
    let engine = engine_for(&processor, fast_config());

    let token = CancellationToken::new();
    token.cancel();
    let result = engine
        .execute_task(request("never runs").with_cancellation(token))
        .await;

    assert_eq!(result.status, TaskStatus::Cancelled);
    assert!(!result.success);
    assert_eq!(processor.calls(), 0);

    let metrics = engine.metrics();
    assert_eq!(metrics.cancelled_tasks, 1);
    assert_eq!(metrics.total_tasks_executed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_task_while_waiting_for_admission() {
    let processor = CountingProcessor::new("general", Duration::from_millis(200));
    let config = EngineConfig {
        max_concurrent_tasks: 1,
        ..fast_config()
    };
    let engine = Arc::new(engine_for(&processor, config));

    let running = request("long job");
    let waiting = request("queued job");
    let (running_id, waiting_id) = (running.id, waiting.id);

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.execute_task(running).await }
    });
    wait_for_status(&engine, running_id, TaskStatus::Running).await;

    let second = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.execute_task(waiting).await }
    });
    wait_for_status(&engine, waiting_id, TaskStatus::Queued).await;

    assert!(engine.cancel_task(waiting_id));
    let cancelled = second.await.unwrap();
    assert_eq!(cancelled.status, TaskStatus::Cancelled);

    let completed = first.await.unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(processor.calls(), 1);

    let metrics = engine.metrics();
    assert_eq!(metrics.cancelled_tasks, 1);
    assert_eq!(metrics.total_tasks_executed, 1);
    assert!(engine.active_statuses().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_running_task_is_reported_after_processor_returns() {
    let processor = CountingProcessor::new("general", Duration::from_millis(200));
    let engine = Arc::new(engine_for(&processor, fast_config()));

    let job = request("long job");
    let job_id = job.id;
    let handle = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.execute_task(job).await }
    });
    wait_for_status(&engine, job_id, TaskStatus::Running).await;

    assert!(engine.cancel_task(job_id));
    assert_eq!(engine.task_status(job_id), TaskStatus::Cancelled);

    let result = handle.await.unwrap();
    assert_eq!(result.status, TaskStatus::Cancelled);
    assert_eq!(processor.calls(), 1);
    assert_eq!(engine.task_status(job_id), TaskStatus::Pending);
}

#[tokio::test]
async fn test_unknown_tasks() {
    let processor = CountingProcessor::new("general", Duration::ZERO);
    let engine = engine_for(&processor, fast_config());
    let unknown = TaskId::default();

    assert_eq!(engine.task_status(unknown), TaskStatus::Pending);
    assert!(!engine.cancel_task(unknown));
    assert!(matches!(
        engine.retry_task(unknown).await,
        Err(Error::RetryUnsupported(id)) if id == unknown
    ));
}

#[tokio::test(start_paused = true)]
async fn test_task_timeout_fails_the_task() {
    let processor = CountingProcessor::new("general", Duration::from_secs(5));
    let engine = engine_for(&processor, fast_config());

    let result = engine
        .execute_task(request("slow job").with_timeout(Duration::from_millis(50)))
        .await;

    assert_eq!(result.status, TaskStatus::Failed);
    assert!(result.errors[0].contains("timed out"));
    assert_eq!(engine.metrics().failed_tasks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_strategy_timeout_applies_when_enforced() {
    let processor = CountingProcessor::new("general", Duration::from_secs(5));
    let engine = engine_for(&processor, fast_config());
    let strategy = ExecutionStrategy::new(ExecutionMode::Sequential)
        .with_timeout(Duration::from_millis(100));

    let batch = engine
        .execute_tasks(requests(&["slow job"]), &strategy, None)
        .await;
    assert_eq!(batch.results[0].status, TaskStatus::Failed);

    let relaxed_processor = CountingProcessor::new("general", Duration::from_secs(5));
    let relaxed = engine_for(
        &relaxed_processor,
        EngineConfig {
            enforce_task_timeout: false,
            ..fast_config()
        },
    );
    let relaxed_batch = relaxed
        .execute_tasks(requests(&["slow job"]), &strategy, None)
        .await;
    assert_eq!(relaxed_batch.results[0].status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_processor_panic_becomes_failed_result() {
    let panicking: Arc<dyn CommandProcessor> = Arc::new(PanickingProcessor);
    let engine = TaskExecutionEngine::new(registry(vec![panicking]), fast_config());

    let result = engine.execute_task(request("explode")).await;
    assert_eq!(result.status, TaskStatus::Failed);
    assert!(result.message.contains("panicked"));

    let again = engine.execute_task(request("explode again")).await;
    assert_eq!(again.status, TaskStatus::Failed);
    assert_eq!(engine.metrics().failed_tasks, 2);
}

#[tokio::test]
async fn test_processor_error_and_missing_processor_fail_the_task() {
    let erroring: Arc<dyn CommandProcessor> = Arc::new(ErroringProcessor);
    let engine = TaskExecutionEngine::new(registry(vec![erroring]), fast_config());
    let errored = engine.execute_task(request("anything")).await;
    assert_eq!(errored.status, TaskStatus::Failed);
    assert_eq!(errored.processor_used.as_deref(), Some("general"));
    assert!(errored.errors[0].contains("cannot handle"));

    let empty = TaskExecutionEngine::new(registry(Vec::new()), fast_config());
    let missing = empty.execute_task(request("anything")).await;
    assert_eq!(missing.status, TaskStatus::Failed);
    assert_eq!(empty.metrics().failed_tasks, 1);
}

#[tokio::test]
async fn test_events_follow_task_lifecycle() {
    let processor = CountingProcessor::new("general", Duration::from_millis(1));
    let engine = engine_for(&processor, fast_config());
    let mut events = engine.subscribe();

    let job = request("observed job");
    let job_id = job.id;
    let result = engine.execute_task(job).await;
    assert!(result.success);
    assert!(result.metrics.contains_key("processing_ms"));

    let mut statuses = Vec::new();
    let mut completed = false;
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.task_id(), job_id);
        match event {
            TaskEvent::Progress { status, .. } => statuses.push(status),
            TaskEvent::Completed { result: finished, .. } => {
                completed = true;
                assert_eq!(finished.status, TaskStatus::Completed);
            }
        }
    }
    assert_eq!(
        statuses,
        vec![TaskStatus::Queued, TaskStatus::Running, TaskStatus::Completed]
    );
    assert!(completed);
}

#[tokio::test(start_paused = true)]
async fn test_sampler_records_concurrency_peak() {
    let processor = CountingProcessor::new("general", Duration::from_secs(3));
    let config = EngineConfig {
        metrics_interval_secs: 1,
        ..fast_config()
    };
    let engine = engine_for(&processor, config);
    let strategy = ExecutionStrategy::new(ExecutionMode::Parallel).with_max_parallel(3);

    let batch = engine
        .execute_tasks(requests(&["a", "b", "c"]), &strategy, None)
        .await;

    assert_eq!(batch.results.len(), 3);
    assert_eq!(engine.metrics().concurrent_tasks_peak, 3);
}

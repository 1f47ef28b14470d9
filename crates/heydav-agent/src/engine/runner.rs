//! Single-task execution path shared by every strategy.

use core::any::Any;
use core::result::Result as StdResult;
use core::time::Duration;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt as _;
use heydav_core::{
    CommandProcessor, CommandRequest, CommandResult, EngineConfig, Error, EventChannel,
    ProcessorFactory, Result, TaskExecutionRequest, TaskExecutionResult, TaskId, TaskStatus,
};
use serde_json::Value;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::metrics::MetricsRecorder;
use super::routing::select_processor;
use super::state::ActiveTasks;

type Permits = (Option<OwnedSemaphorePermit>, OwnedSemaphorePermit);

enum Attempt {
    Cancelled,
    Rejected(String),
    Finished {
        processor: Option<String>,
        outcome: Result<CommandResult>,
        queue_wait: Duration,
        processing: Duration,
    },
}

/// Runs individual tasks against the processor factory.
///
/// Cloning is cheap; all clones share the admission semaphore, the active-task
/// registry, the metrics and the event channel of one engine.
#[derive(Clone)]
pub struct TaskRunner {
    pub(super) processors: Arc<dyn ProcessorFactory>,
    pub(super) admission: Arc<Semaphore>,
    pub(super) active: Arc<ActiveTasks>,
    pub(super) metrics: Arc<MetricsRecorder>,
    pub(super) events: EventChannel,
}

impl TaskRunner {
    pub(super) fn new(processors: Arc<dyn ProcessorFactory>, config: &EngineConfig) -> Self {
        Self {
            processors,
            admission: Arc::new(Semaphore::new(config.max_concurrent_tasks.max(1))),
            active: Arc::new(ActiveTasks::default()),
            metrics: Arc::new(MetricsRecorder::default()),
            events: EventChannel::new(config.event_capacity),
        }
    }

    /// Runs one task to a terminal status.
    ///
    /// The task waits for a permit from `limiter` (when given) and from the
    /// engine-wide admission semaphore. Cancellation is honored while waiting
    /// and checked again once the processor returns; a processor call already
    /// in progress is not interrupted.
    pub async fn run(
        &self,
        request: &TaskExecutionRequest,
        limiter: Option<Arc<Semaphore>>,
    ) -> TaskExecutionResult {
        let task_id = request.id;
        let submitted = Instant::now();
        let started_at = Utc::now();
        let token = request.cancellation.child_token();

        self.active.register(task_id, token.clone());
        self.events.progress(task_id, TaskStatus::Queued, "Task queued");

        let mut result = match self.attempt(request, &token, limiter, submitted).await {
            Attempt::Cancelled => {
                info!("Task {} cancelled", task_id);
                TaskExecutionResult::cancelled(task_id)
            }
            Attempt::Rejected(reason) => TaskExecutionResult::failed(task_id, reason),
            Attempt::Finished {
                processor,
                outcome,
                queue_wait,
                processing,
            } => {
                let mut finished = match outcome {
                    Ok(command_result) => Self::from_command_result(task_id, command_result),
                    Err(failure) => {
                        error!("Task {} failed: {}", task_id, failure);
                        TaskExecutionResult::failed(task_id, failure.to_string())
                    }
                };
                finished.processor_used = processor;
                finished
                    .metrics
                    .insert("queue_wait_ms".to_owned(), queue_wait.as_secs_f64() * 1000.0);
                finished
                    .metrics
                    .insert("processing_ms".to_owned(), processing.as_secs_f64() * 1000.0);
                finished
            }
        };

        result.started_at = started_at;
        result.ended_at = Utc::now();
        result.execution_time = submitted.elapsed();

        if result.status == TaskStatus::Cancelled {
            self.metrics.record_cancelled();
        } else {
            self.metrics.record(&result);
        }

        self.active.remove(task_id);
        self.events
            .progress(task_id, result.status, result.message.clone());
        self.events.completed(result.clone());
        debug!(
            "Task {} finished with status {} in {:?}",
            task_id, result.status, result.execution_time
        );
        result
    }

    async fn attempt(
        &self,
        request: &TaskExecutionRequest,
        token: &CancellationToken,
        limiter: Option<Arc<Semaphore>>,
        submitted: Instant,
    ) -> Attempt {
        if token.is_cancelled() {
            return Attempt::Cancelled;
        }

        let acquired = tokio::select! {
            biased;
            () = token.cancelled() => return Attempt::Cancelled,
            acquired = self.acquire(limiter) => acquired,
        };
        let permits = match acquired {
            Ok(permits) => permits,
            Err(closed) => return Attempt::Rejected(format!("Admission closed: {closed}")),
        };
        let queue_wait = submitted.elapsed();

        self.active
            .transition(request.id, TaskStatus::Running, "Processing");
        self.events
            .progress(request.id, TaskStatus::Running, "Processing");

        let processor = match select_processor(self.processors.as_ref(), request) {
            Ok(processor) => processor,
            Err(failure) => {
                drop(permits);
                return Attempt::Finished {
                    processor: None,
                    outcome: Err(failure),
                    queue_wait,
                    processing: Duration::ZERO,
                };
            }
        };

        let command = Self::derive_command(request, processor.processor_type());
        let processing_started = Instant::now();
        let outcome = Self::invoke(processor.as_ref(), &command, request.timeout).await;
        let processing = processing_started.elapsed();
        drop(permits);

        if token.is_cancelled() {
            return Attempt::Cancelled;
        }

        Attempt::Finished {
            processor: Some(processor.processor_type().to_owned()),
            outcome,
            queue_wait,
            processing,
        }
    }

    async fn acquire(
        &self,
        limiter: Option<Arc<Semaphore>>,
    ) -> StdResult<Permits, AcquireError> {
        let local = match limiter {
            Some(limiter) => Some(limiter.acquire_owned().await?),
            None => None,
        };
        let global = Arc::clone(&self.admission).acquire_owned().await?;
        Ok((local, global))
    }

    async fn invoke(
        processor: &dyn CommandProcessor,
        command: &CommandRequest,
        deadline: Option<Duration>,
    ) -> Result<CommandResult> {
        let call = async {
            match AssertUnwindSafe(processor.process(command))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(payload) => Err(Error::Processor(format!(
                    "Processor {} panicked: {}",
                    processor.processor_type(),
                    panic_message(payload.as_ref())
                ))),
            }
        };

        match deadline {
            Some(limit) => timeout(limit, call)
                .await
                .unwrap_or_else(|_elapsed| Err(Error::Timeout(limit))),
            None => call.await,
        }
    }

    /// Command handed to the processor: the request's command, routed to the
    /// chosen processor, with batch data and task parameters merged in.
    fn derive_command(request: &TaskExecutionRequest, processor_type: &str) -> CommandRequest {
        let mut context = request.context.shared_data.snapshot();
        context.extend(
            request
                .command
                .context
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        context.insert("task_id".to_owned(), Value::String(request.id.to_string()));
        context.insert(
            "intent".to_owned(),
            Value::String(request.task.intent.as_str().to_owned()),
        );

        let mut command = request
            .command
            .clone()
            .with_context(context)
            .with_processor_type(processor_type);
        for (key, value) in &request.task.parameters {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            command.parameters.entry(key.clone()).or_insert(text);
        }
        command
    }

    fn from_command_result(task_id: TaskId, command_result: CommandResult) -> TaskExecutionResult {
        let status = if command_result.success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        let mut result = TaskExecutionResult::new(task_id, status);
        result.success = command_result.success;
        result.message.clone_from(&command_result.message);
        result.data.clone_from(&command_result.data);
        if !command_result.success {
            result.errors.push(command_result.message.clone());
        }
        result.sub_results.push(command_result);
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

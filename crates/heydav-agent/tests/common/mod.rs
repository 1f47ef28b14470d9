//! Mock processors, plugins and executors shared by the integration suites.
#![allow(dead_code, reason = "Each test binary uses a subset of the helpers")]

use core::time::Duration;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use heydav_agent::{ProcessorRegistry, TaskExecutor};
use heydav_core::{
    BatchExecutionResult, CommandCapabilities, CommandProcessor, CommandRequest, CommandResult,
    Error, EventChannel, ExecutionMetrics, ExecutionStrategy, IgnoreLock as _, Intent, Plugin,
    PluginCapabilities, Result, TaskBreakdown, TaskDependencyGraph, TaskEvent,
    TaskExecutionRequest, TaskExecutionResult, TaskId, TaskStatus,
};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;

/// Processor that records calls and peak concurrency.
///
/// Commands containing "fail" produce a failed result.
pub struct CountingProcessor {
    name: String,
    patterns: Vec<String>,
    delay: Duration,
    current: AtomicUsize,
    max_seen: AtomicUsize,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl CountingProcessor {
    pub fn new(name: &str, delay: Duration) -> Arc<Self> {
        Self::with_patterns(name, delay, &[])
    }

    pub fn with_patterns(name: &str, delay: Duration, patterns: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            patterns: patterns.iter().map(|pattern| (*pattern).to_owned()).collect(),
            delay,
            current: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock_ignore_poison().clone()
    }
}

#[async_trait]
impl CommandProcessor for CountingProcessor {
    fn processor_type(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> CommandCapabilities {
        CommandCapabilities::new(self.patterns.clone(), format!("{} processor", self.name))
    }

    async fn process(&self, request: &CommandRequest) -> Result<CommandResult> {
        let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(running, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock_ignore_poison().push(request.command.clone());

        sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        if request.command.contains("fail") {
            Ok(CommandResult::failure(format!("{} could not do it", self.name)))
        } else {
            Ok(CommandResult::success(format!("{} handled: {}", self.name, request.command)))
        }
    }
}

/// Processor that panics on every call.
pub struct PanickingProcessor;

#[async_trait]
impl CommandProcessor for PanickingProcessor {
    fn processor_type(&self) -> &str {
        "general"
    }

    fn capabilities(&self) -> CommandCapabilities {
        CommandCapabilities::default()
    }

    async fn process(&self, _request: &CommandRequest) -> Result<CommandResult> {
        panic!("processor exploded");
    }
}

/// Processor that always returns an error.
pub struct ErroringProcessor;

#[async_trait]
impl CommandProcessor for ErroringProcessor {
    fn processor_type(&self) -> &str {
        "general"
    }

    fn capabilities(&self) -> CommandCapabilities {
        CommandCapabilities::default()
    }

    async fn process(&self, request: &CommandRequest) -> Result<CommandResult> {
        Err(Error::Processor(format!("cannot handle '{}'", request.command)))
    }
}

/// Plugin advertising a fixed command list.
pub struct StaticPlugin {
    pub name: String,
    pub commands: Vec<String>,
}

#[async_trait]
impl Plugin for StaticPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn capabilities(&self) -> Result<PluginCapabilities> {
        Ok(PluginCapabilities {
            supported_commands: self.commands.clone(),
            description: format!("{} plugin", self.name),
        })
    }

    async fn execute(
        &self,
        command: &str,
        _parameters: &HashMap<String, Value>,
    ) -> Result<CommandResult> {
        Ok(CommandResult::success(command))
    }
}

/// Executor that completes every request successfully and counts calls.
#[derive(Default)]
pub struct RecordingExecutor {
    batches: AtomicUsize,
    tasks: AtomicUsize,
    events: EventChannel,
}

impl RecordingExecutor {
    pub fn calls(&self) -> usize {
        self.batches.load(Ordering::SeqCst) + self.tasks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskExecutor for RecordingExecutor {
    async fn execute_task(&self, request: TaskExecutionRequest) -> TaskExecutionResult {
        self.tasks.fetch_add(1, Ordering::SeqCst);
        TaskExecutionResult::new(request.id, TaskStatus::Completed)
    }

    async fn execute_tasks(
        &self,
        requests: Vec<TaskExecutionRequest>,
        strategy: &ExecutionStrategy,
        _graph: Option<&TaskDependencyGraph>,
    ) -> BatchExecutionResult {
        self.batches.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        BatchExecutionResult {
            batch_id: TaskId::default(),
            mode: strategy.mode,
            success: true,
            message: "recorded".to_owned(),
            results: requests
                .iter()
                .map(|request| TaskExecutionResult::new(request.id, TaskStatus::Completed))
                .collect(),
            execution_time: Duration::ZERO,
            started_at: now,
            ended_at: now,
        }
    }

    fn stream_tasks(
        &self,
        _requests: mpsc::Receiver<TaskExecutionRequest>,
        _strategy: &ExecutionStrategy,
    ) -> mpsc::Receiver<TaskExecutionResult> {
        let (_sender, receiver) = mpsc::channel(1);
        receiver
    }

    fn task_status(&self, _task_id: TaskId) -> TaskStatus {
        TaskStatus::Pending
    }

    fn active_statuses(&self) -> Vec<(TaskId, TaskStatus)> {
        Vec::new()
    }

    fn cancel_task(&self, _task_id: TaskId) -> bool {
        false
    }

    async fn retry_task(&self, task_id: TaskId) -> Result<TaskExecutionResult> {
        Err(Error::RetryUnsupported(task_id))
    }

    fn metrics(&self) -> ExecutionMetrics {
        ExecutionMetrics::default()
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }
}

/// Registry holding the given processors.
pub fn registry(processors: Vec<Arc<dyn CommandProcessor>>) -> Arc<ProcessorRegistry> {
    Arc::new(
        processors
            .into_iter()
            .fold(ProcessorRegistry::new(), ProcessorRegistry::with_processor),
    )
}

/// Request for a task routed to the `general` processor.
pub fn request(description: &str) -> TaskExecutionRequest {
    TaskExecutionRequest::for_task(TaskBreakdown::new(description, Intent::Unknown), "test")
}

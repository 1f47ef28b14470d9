//! Command orchestration: analysis, fast path, checks, execution, aggregation.

use core::time::Duration;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use heydav_analysis::{LocalTaskAnalyzer, TaskAnalyzer};
use heydav_core::{
    CommandAction, CommandCapabilities, CommandRequest, CommandResult, Error, ExecutionContext,
    ExecutionStrategy, HeyDavConfig, OrchestratorConfig, PluginManager, ProcessorFactory, Result,
    TaskAnalysisResult, TaskBreakdown, TaskDependencyGraph, TaskExecutionRequest,
    TaskExecutionResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json, to_value};
use tracing::{debug, error, info, warn};

use crate::checks::{PreExecutionCheck, PreExecutionChecks};
use crate::engine::{TaskExecutionEngine, TaskExecutor};
use crate::registry::PluginRegistry;

const APPROVAL_MESSAGE: &str =
    "This task requires human approval due to its complexity or potential impact.";

/// Totals over the subtasks of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Subtasks that ran
    pub total_tasks: usize,
    /// Subtasks that succeeded
    pub successful_tasks: usize,
    /// Subtasks that did not succeed
    pub failed_tasks: usize,
    /// Sum of subtask execution times
    pub total_execution_time: Duration,
    /// Mean subtask execution time
    pub average_execution_time: Duration,
    /// Distinct processors involved, sorted
    pub processors_used: Vec<String>,
}

impl AggregatedMetrics {
    /// Aggregates a set of subtask results.
    pub fn from_results(results: &[TaskExecutionResult]) -> Self {
        let successful_tasks = results.iter().filter(|result| result.success).count();
        let total_execution_time: Duration =
            results.iter().map(|result| result.execution_time).sum();
        let average_execution_time = u32::try_from(results.len())
            .ok()
            .and_then(|count| total_execution_time.checked_div(count))
            .unwrap_or_default();
        let processors_used: BTreeSet<&str> = results
            .iter()
            .filter_map(|result| result.processor_used.as_deref())
            .collect();

        Self {
            total_tasks: results.len(),
            successful_tasks,
            failed_tasks: results.len() - successful_tasks,
            total_execution_time,
            average_execution_time,
            processors_used: processors_used.into_iter().map(str::to_owned).collect(),
        }
    }
}

/// Entry point of the command pipeline.
///
/// Simple commands go straight to one processor. Everything else is
/// analyzed into subtasks, gated by approval and pre-execution checks, and
/// handed to the [`TaskExecutor`].
pub struct CommandOrchestrator {
    processors: Arc<dyn ProcessorFactory>,
    analyzer: Arc<dyn TaskAnalyzer>,
    executor: Arc<dyn TaskExecutor>,
    plugins: Arc<dyn PluginManager>,
    checks: PreExecutionChecks,
    config: OrchestratorConfig,
}

impl CommandOrchestrator {
    /// Creates an orchestrator over explicit collaborators.
    pub fn new(
        processors: Arc<dyn ProcessorFactory>,
        analyzer: Arc<dyn TaskAnalyzer>,
        executor: Arc<dyn TaskExecutor>,
        plugins: Arc<dyn PluginManager>,
    ) -> Self {
        Self {
            checks: PreExecutionChecks::with_defaults(Arc::clone(&processors)),
            processors,
            analyzer,
            executor,
            plugins,
            config: OrchestratorConfig::default(),
        }
    }

    /// Local analyzer, a fresh engine and no plugins.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn local(processors: Arc<dyn ProcessorFactory>, config: &HeyDavConfig) -> Self {
        let engine = TaskExecutionEngine::new(Arc::clone(&processors), config.engine.clone());
        Self::new(
            processors,
            Arc::new(LocalTaskAnalyzer::default()),
            Arc::new(engine),
            Arc::new(PluginRegistry::default()),
        )
        .with_config(config.orchestrator.clone())
    }

    /// Replaces the orchestrator settings.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers (or replaces) a named pre-execution check.
    #[must_use]
    pub fn with_check(mut self, name: impl Into<String>, check: Arc<dyn PreExecutionCheck>) -> Self {
        self.checks.register(name, check);
        self
    }

    /// Processes a command end to end. Failures are reported in the result.
    pub async fn process_command(&self, request: &CommandRequest) -> CommandResult {
        let started = Instant::now();

        if request.is_blank() {
            return CommandResult::failure(Error::EmptyCommand.to_string())
                .with_processing_time(started.elapsed());
        }

        info!("Processing command from {}: {}", request.source, request.command);

        let analysis = match self.analyzer.analyze(&request.command, &request.context).await {
            Ok(analysis) => analysis,
            Err(failure) => {
                error!("Analysis failed for '{}': {}", request.command, failure);
                return Self::error_result(&failure, started);
            }
        };

        if analysis.is_fast_path() {
            return self.process_simple(request, started).await;
        }

        self.process_analyzed(&analysis, started).await
    }

    /// Builds a request from plain text and processes it.
    pub async fn process_text(
        &self,
        command: &str,
        source: &str,
        context: HashMap<String, Value>,
    ) -> CommandResult {
        let request = CommandRequest::new(command, source).with_context(context);
        self.process_command(&request).await
    }

    /// Processes a command with an explicit processor type.
    ///
    /// The processor type decides the fast path; commands that need full
    /// analysis still go through the engine.
    pub async fn process_with_processor(
        &self,
        command: &str,
        processor_type: &str,
        source: &str,
    ) -> CommandResult {
        let request = CommandRequest::new(command, source).with_processor_type(processor_type);
        self.process_command(&request).await
    }

    /// Analyzes a command without executing it.
    ///
    /// # Errors
    /// Returns an error if the analyzer rejects the command.
    pub async fn analyze_command(
        &self,
        command: &str,
        context: &HashMap<String, Value>,
    ) -> Result<TaskAnalysisResult> {
        self.analyzer.analyze(command, context).await
    }

    /// Runs subtasks through the executor.
    ///
    /// With an acyclic graph, tasks are submitted in dependency order.
    pub async fn execute_breakdown(
        &self,
        tasks: &[TaskBreakdown],
        strategy: &ExecutionStrategy,
        graph: Option<&TaskDependencyGraph>,
    ) -> Vec<TaskExecutionResult> {
        let origin = CommandRequest::new(String::new(), self.config.source_name.clone());
        self.run_breakdown(&origin, tasks, strategy, graph).await
    }

    /// Capabilities of every processor and loaded plugin.
    pub async fn available_commands(&self) -> Vec<CommandCapabilities> {
        let processors = self.processors.all_processors();
        let mut capabilities: Vec<CommandCapabilities> = processors
            .iter()
            .map(|processor| processor.capabilities())
            .collect();

        let plugins = self.plugins.loaded_plugins().await;
        for plugin in &plugins {
            match plugin.capabilities().await {
                Ok(plugin_capabilities) => {
                    let mut entry = CommandCapabilities::new(
                        plugin_capabilities.supported_commands,
                        format!("Plugin: {}", plugin.name()),
                    );
                    entry.supported_sources.push("all".to_owned());
                    capabilities.push(entry);
                }
                Err(failure) => {
                    warn!("Plugin {} did not report capabilities: {}", plugin.name(), failure);
                }
            }
        }

        debug!(
            "Collected capabilities for {} processors and {} plugins",
            processors.len(),
            plugins.len()
        );
        capabilities
    }

    async fn process_simple(&self, request: &CommandRequest, started: Instant) -> CommandResult {
        let selected = match request.processor_type.as_deref() {
            Some(processor_type) => {
                debug!("Using requested processor {}", processor_type);
                self.processors.get_processor(processor_type)
            }
            None => self.processors.get_best_processor(&request.command),
        };
        let processor = match selected {
            Ok(processor) => processor,
            Err(failure) => {
                error!("No processor for '{}': {}", request.command, failure);
                return Self::error_result(&failure, started);
            }
        };

        match processor.process(request).await {
            Ok(mut result) => {
                result.processing_time = started.elapsed();
                if result.processor_used.is_none() {
                    result.processor_used = Some(processor.processor_type().to_owned());
                }
                info!(
                    "Simple command processed by {} in {:?}. Success: {}",
                    processor.processor_type(),
                    result.processing_time,
                    result.success
                );
                result
            }
            Err(failure) => {
                error!(
                    "Processor {} failed on '{}': {}",
                    processor.processor_type(),
                    request.command,
                    failure
                );
                Self::error_result(&failure, started)
            }
        }
    }

    async fn process_analyzed(
        &self,
        analysis: &TaskAnalysisResult,
        started: Instant,
    ) -> CommandResult {
        if analysis.suggested_strategy.requires_human_approval {
            warn!("Command requires human approval: {}", analysis.original_command);
            let mut result = CommandResult::failure(APPROVAL_MESSAGE)
                .with_action(CommandAction::Query)
                .with_processing_time(started.elapsed());
            result.data = to_value(analysis)
                .inspect_err(|failure| warn!("Could not attach analysis: {}", failure))
                .ok();
            return result;
        }

        if let Some(check) = self.checks.first_failure(analysis).await {
            warn!("Pre-execution check {} failed", check);
            return CommandResult::failure(format!("Pre-execution check failed: {check}"))
                .with_processing_time(started.elapsed());
        }

        let mut strategy = analysis.suggested_strategy.clone();
        strategy.configuration.fail_fast = self.config.fail_fast;

        let origin = CommandRequest::new(
            analysis.original_command.clone(),
            self.config.source_name.clone(),
        );
        let results = self
            .run_breakdown(&origin, &analysis.subtasks, &strategy, Some(&analysis.dependencies))
            .await;

        self.aggregate(analysis, &strategy, &results, started)
    }

    async fn run_breakdown(
        &self,
        origin: &CommandRequest,
        tasks: &[TaskBreakdown],
        strategy: &ExecutionStrategy,
        graph: Option<&TaskDependencyGraph>,
    ) -> Vec<TaskExecutionResult> {
        info!(
            "Executing task breakdown with {} tasks using {} mode",
            tasks.len(),
            strategy.mode
        );

        let shared = ExecutionContext::default();
        let requests: Vec<TaskExecutionRequest> = Self::dependency_order(tasks, graph)
            .into_iter()
            .map(|task| {
                let command = CommandRequest::new(task.description.clone(), origin.source.clone())
                    .with_context(origin.context.clone())
                    .with_priority(origin.priority);
                TaskExecutionRequest::for_task(task.clone(), origin.source.clone())
                    .with_command(command)
                    .with_context(shared.clone())
            })
            .collect();

        let batch = self.executor.execute_tasks(requests, strategy, graph).await;
        batch.results
    }

    /// Tasks sorted by the graph's execution order; unknown tasks keep their place at the end.
    fn dependency_order<'tasks>(
        tasks: &'tasks [TaskBreakdown],
        graph: Option<&TaskDependencyGraph>,
    ) -> Vec<&'tasks TaskBreakdown> {
        let mut ordered: Vec<&TaskBreakdown> = tasks.iter().collect();
        let Some(graph) = graph.filter(|graph| !graph.has_circular_dependency) else {
            return ordered;
        };

        let position: HashMap<_, _> = graph
            .execution_order
            .iter()
            .enumerate()
            .map(|(index, task_id)| (*task_id, index))
            .collect();
        ordered.sort_by_key(|task| position.get(&task.id).copied().unwrap_or(usize::MAX));
        ordered
    }

    fn aggregate(
        &self,
        analysis: &TaskAnalysisResult,
        strategy: &ExecutionStrategy,
        results: &[TaskExecutionResult],
        started: Instant,
    ) -> CommandResult {
        let metrics = AggregatedMetrics::from_results(results);
        let success = metrics.failed_tasks == 0;
        let message = if success {
            "Complex command executed successfully".to_owned()
        } else {
            format!(
                "Complex command executed with some failures. {} subtask(s) failed.",
                metrics.failed_tasks
            )
        };
        let total_duration_ms: f64 = results
            .iter()
            .map(|result| result.execution_time.as_secs_f64() * 1000.0)
            .sum();

        let base = if success {
            CommandResult::success(message)
        } else {
            CommandResult::failure(message)
        };
        let mut result = base
            .with_processor(self.config.source_name.clone())
            .with_metadata("subtask_count", json!(results.len()))
            .with_metadata("execution_mode", json!(strategy.mode.to_string()))
            .with_metadata("total_duration", json!(total_duration_ms))
            .with_processing_time(started.elapsed());

        result.data = Self::aggregated_data(analysis, results, &metrics)
            .inspect_err(|failure| warn!("Could not serialize execution results: {}", failure))
            .ok();
        result
    }

    fn aggregated_data(
        analysis: &TaskAnalysisResult,
        results: &[TaskExecutionResult],
        metrics: &AggregatedMetrics,
    ) -> serde_json::Result<Value> {
        let mut data = Map::new();
        data.insert("analysis".to_owned(), to_value(analysis)?);
        data.insert("execution_results".to_owned(), to_value(results)?);
        data.insert("metrics".to_owned(), to_value(metrics)?);
        Ok(Value::Object(data))
    }

    fn error_result(failure: &Error, started: Instant) -> CommandResult {
        CommandResult::failure(format!(
            "An error occurred while processing your command: {failure}"
        ))
        .with_processor("error-handler")
        .with_processing_time(started.elapsed())
    }
}

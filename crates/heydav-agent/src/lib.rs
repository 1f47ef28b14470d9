//! Execution and orchestration for the `HeyDav` command pipeline.
//!
//! [`TaskExecutionEngine`] runs analyzed subtasks under a concurrency
//! strategy with admission control, cancellation and metrics.
//! [`CommandOrchestrator`] is the entry point: it analyzes a command, picks
//! the fast path or the engine, runs pre-execution checks and aggregates the
//! results.

/// Named pre-execution checks
pub mod checks;
/// Task execution engine and batch strategies
pub mod engine;
/// Command orchestration
pub mod orchestrator;
/// In-memory processor and plugin registries
pub mod registry;
/// Tracing subscriber setup
pub mod telemetry;

pub use checks::{
    AgentAvailabilityCheck, DestructiveOperationCheck, PreExecutionCheck, PreExecutionChecks,
};
pub use engine::{
    BatchPlan, StrategyExecutor, StrategyOutcome, StrategyTable, TaskExecutionEngine,
    TaskExecutor, TaskRunner,
};
pub use orchestrator::{AggregatedMetrics, CommandOrchestrator};
pub use registry::{PluginRegistry, ProcessorRegistry};
pub use telemetry::init_tracing;

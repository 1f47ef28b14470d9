//! Task data model shared by the analyzer, the engine and the orchestrator.

/// Analysis output.
pub mod analysis;
/// Execution requests, results and statuses.
pub mod execution;
/// Dependency graph representation.
pub mod graph;
/// Aggregated engine metrics.
pub mod metrics;
/// Execution modes and strategies.
pub mod strategy;
/// Task identity, intents, complexity tiers and breakdowns.
pub mod types;

pub use analysis::TaskAnalysisResult;
pub use execution::{
    BatchExecutionResult, ExecutionContext, SharedData, TaskExecutionRequest,
    TaskExecutionResult, TaskStatus,
};
pub use graph::{DependencyMap, TaskDependencyGraph};
pub use metrics::ExecutionMetrics;
pub use strategy::{ExecutionConfiguration, ExecutionMode, ExecutionStrategy, FailFastPolicy};
pub use types::{Complexity, Intent, TaskBreakdown, TaskId};

//! Core types and traits for the `HeyDav` command pipeline.
//!
//! This crate holds the shared data model (commands, task breakdowns,
//! dependency graphs, strategies, execution results), the collaborator traits
//! the pipeline consumes (command processors, processor factories, plugins),
//! plus error handling, configuration and event plumbing.

/// Command requests, results and processor capabilities.
pub mod command;
/// Configuration for the engine, orchestrator and logging.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Task lifecycle events.
pub mod events;
/// Poison-tolerant lock helpers.
pub mod sync;
/// Task, analysis, strategy and execution data model.
pub mod task;
/// Collaborator traits consumed by the pipeline.
pub mod traits;

pub use command::{
    CommandAction, CommandCapabilities, CommandPriority, CommandRequest, CommandResult,
};
pub use config::{EngineConfig, HeyDavConfig, LoggingConfig, OrchestratorConfig};
pub use error::{Error, Result};
pub use events::{EventChannel, TaskEvent};
pub use sync::{IgnoreLock, IgnoreRwLock};
pub use task::{
    BatchExecutionResult, Complexity, DependencyMap, ExecutionConfiguration, ExecutionContext,
    ExecutionMetrics, ExecutionMode, ExecutionStrategy, FailFastPolicy, Intent, SharedData,
    TaskAnalysisResult, TaskBreakdown, TaskDependencyGraph, TaskExecutionRequest,
    TaskExecutionResult, TaskId, TaskStatus,
};
pub use traits::{
    CommandProcessor, Plugin, PluginCapabilities, PluginManager, ProcessorFactory,
};

//! Task analysis and complexity estimation.
//!
//! This module provides tools for classifying intent, estimating complexity,
//! extracting entities, decomposing commands into subtasks and suggesting how
//! to execute them.

/// Agent keyword catalog
pub mod agents;
/// Complexity estimation for commands
pub mod complexity;
/// Command decomposition into subtasks
pub mod decompose;
/// Entity, parameter and capability extraction
pub mod entities;
/// Intent classification
pub mod intent;
/// Local task analyzer implementation
pub mod local;
/// Strategy, duration and confidence heuristics
pub mod strategy;

use std::collections::HashMap;

use async_trait::async_trait;
use heydav_core::{
    Complexity, ExecutionStrategy, Result, TaskAnalysisResult, TaskBreakdown,
    TaskDependencyGraph,
};
use serde_json::Value;

pub use agents::AgentCatalog;
pub use complexity::ComplexityEstimator;
pub use decompose::TaskDecomposer;
pub use entities::EntityExtractor;
pub use intent::IntentClassifier;
pub use local::LocalTaskAnalyzer;
pub use strategy::{CONFIRM_DESTRUCTIVE_OPERATIONS, StrategyAdvisor, VERIFY_AGENT_AVAILABILITY};

/// Trait for command analysis strategies
#[async_trait]
pub trait TaskAnalyzer: Send + Sync {
    /// Analyze a command into intent, subtasks, dependencies and a strategy.
    ///
    /// # Errors
    /// Returns an error if the command cannot be analyzed (for example when it is empty).
    async fn analyze(
        &self,
        command: &str,
        context: &HashMap<String, Value>,
    ) -> Result<TaskAnalysisResult>;

    /// Estimate complexity without full analysis (fast path)
    fn estimate_complexity(&self, command: &str) -> Complexity;

    /// Decompose a command into subtasks.
    fn breakdown(&self, command: &str) -> Vec<TaskBreakdown>;

    /// Infer the dependency graph of a set of subtasks.
    fn analyze_dependencies(&self, tasks: &[TaskBreakdown]) -> TaskDependencyGraph;

    /// Recommend an execution strategy for an analysis.
    fn suggest_strategy(&self, analysis: &TaskAnalysisResult) -> ExecutionStrategy;
}

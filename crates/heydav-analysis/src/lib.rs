//! Command analysis for the `HeyDav` pipeline.
//!
//! Turns a free-text command into a [`TaskAnalysisResult`]: intent,
//! complexity tier, entities and parameters, decomposed subtasks, their
//! dependency graph, and a suggested execution strategy.
//!
//! [`TaskAnalysisResult`]: heydav_core::TaskAnalysisResult

/// Heuristic command analysis.
pub mod analyzer;
/// Dependency inference and graph algorithms.
pub mod graph;

pub use analyzer::{
    AgentCatalog, ComplexityEstimator, EntityExtractor, IntentClassifier, LocalTaskAnalyzer,
    StrategyAdvisor, TaskAnalyzer, TaskDecomposer,
};
pub use graph::{
    DeclaredDependencies, DependencyGraphBuilder, DependencyPolicy, KeywordIntentPolicy,
    has_cycle, parallel_groups, topological_order,
};

use std::collections::HashMap;

use async_trait::async_trait;
use heydav_core::{
    Complexity, Error, ExecutionStrategy, Result, TaskAnalysisResult, TaskBreakdown,
    TaskDependencyGraph,
};
use serde_json::Value;

use super::agents::AgentCatalog;
use super::complexity::ComplexityEstimator;
use super::decompose::TaskDecomposer;
use super::entities::EntityExtractor;
use super::intent::IntentClassifier;
use super::strategy::StrategyAdvisor;
use super::TaskAnalyzer;
use crate::graph::{DependencyGraphBuilder, DependencyPolicy};

/// Local task analyzer using keyword heuristics (no model required)
#[derive(Default)]
pub struct LocalTaskAnalyzer {
    intents: IntentClassifier,
    complexity: ComplexityEstimator,
    entities: EntityExtractor,
    agents: AgentCatalog,
    decomposer: TaskDecomposer,
    advisor: StrategyAdvisor,
    graph_builder: DependencyGraphBuilder,
}

impl LocalTaskAnalyzer {
    /// Replace the dependency inference policy
    #[must_use]
    pub fn with_dependency_policy(mut self, policy: impl DependencyPolicy + 'static) -> Self {
        self.graph_builder = DependencyGraphBuilder::new(policy);
        self
    }

    fn decompose(&self, command: &str) -> Vec<TaskBreakdown> {
        let intent = self.intents.classify(command);
        let complexity = self.complexity.estimate(command);
        self.decomposer.decompose(command, intent, complexity)
    }
}

#[async_trait]
impl TaskAnalyzer for LocalTaskAnalyzer {
    async fn analyze(
        &self,
        command: &str,
        context: &HashMap<String, Value>,
    ) -> Result<TaskAnalysisResult> {
        if command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }

        let intent = self.intents.classify(command);
        let detected_entities = self.entities.entities(command);
        let complexity = self
            .complexity
            .estimate_with_entities(command, detected_entities.len());
        let extracted_parameters = self.entities.parameters(command);

        let mut subtasks = self.decomposer.decompose(command, intent, complexity);
        let dependencies = self.graph_builder.build(&subtasks);
        DependencyGraphBuilder::attach_dependencies(&mut subtasks, &dependencies);

        let estimated_duration = self.advisor.estimate_duration(complexity, &subtasks);
        let confidence_score = self.advisor.confidence(
            intent,
            detected_entities.len(),
            extracted_parameters.len(),
        );

        let mut analysis = TaskAnalysisResult {
            original_command: command.to_owned(),
            intent,
            complexity,
            required_capabilities: self.entities.capabilities(intent, &detected_entities),
            required_agents: self.agents.required_agents(command),
            subtasks,
            dependencies,
            suggested_strategy: ExecutionStrategy::default(),
            extracted_parameters,
            detected_entities,
            confidence_score,
            estimated_duration,
        };
        analysis.suggested_strategy = self.advisor.suggest(&analysis);

        tracing::info!(
            "Command analysis: intent={} complexity={} subtasks={} mode={} confidence={:.2} (context keys: {})",
            analysis.intent,
            analysis.complexity,
            analysis.subtasks.len(),
            analysis.suggested_strategy.mode,
            analysis.confidence_score,
            context.len()
        );

        Ok(analysis)
    }

    fn estimate_complexity(&self, command: &str) -> Complexity {
        self.complexity.estimate(command)
    }

    fn breakdown(&self, command: &str) -> Vec<TaskBreakdown> {
        self.decompose(command)
    }

    fn analyze_dependencies(&self, tasks: &[TaskBreakdown]) -> TaskDependencyGraph {
        self.graph_builder.build(tasks)
    }

    fn suggest_strategy(&self, analysis: &TaskAnalysisResult) -> ExecutionStrategy {
        self.advisor.suggest(analysis)
    }
}

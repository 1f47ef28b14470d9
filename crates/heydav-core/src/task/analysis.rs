use core::time::Duration;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::graph::TaskDependencyGraph;
use super::strategy::ExecutionStrategy;
use super::types::{Complexity, Intent, TaskBreakdown};

/// Everything the analyzer learned about a command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskAnalysisResult {
    /// Command as submitted
    pub original_command: String,
    /// Primary intent
    pub intent: Intent,
    /// Complexity tier of the whole command
    pub complexity: Complexity,
    /// Capabilities a processor needs
    pub required_capabilities: Vec<String>,
    /// Agents whose keywords appear in the command
    pub required_agents: Vec<String>,
    /// Decomposed subtasks
    pub subtasks: Vec<TaskBreakdown>,
    /// Dependency structure of the subtasks
    pub dependencies: TaskDependencyGraph,
    /// Recommended execution strategy
    pub suggested_strategy: ExecutionStrategy,
    /// Parameters pulled out of the text
    pub extracted_parameters: HashMap<String, Value>,
    /// Named entities found in the text
    pub detected_entities: Vec<String>,
    /// Confidence in the analysis, 0.0 to 1.0
    pub confidence_score: f32,
    /// Expected total run time
    pub estimated_duration: Duration,
}

impl TaskAnalysisResult {
    /// Whether the command can skip the engine and go straight to a processor.
    pub fn is_fast_path(&self) -> bool {
        self.complexity == Complexity::Simple && self.subtasks.len() <= 1
    }
}

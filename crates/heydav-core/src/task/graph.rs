use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::TaskId;

/// Task id → ids of the tasks it depends on.
pub type DependencyMap = HashMap<TaskId, Vec<TaskId>>;

/// Dependency structure of a set of subtasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDependencyGraph {
    /// Dependencies per task
    pub dependencies: DependencyMap,
    /// Dependency-first execution order
    pub execution_order: Vec<TaskId>,
    /// Groups of tasks with no dependency edge between members
    pub parallel_groups: Vec<Vec<TaskId>>,
    /// Whether a directed cycle was detected
    pub has_circular_dependency: bool,
}

impl TaskDependencyGraph {
    /// Dependencies recorded for `id` (empty when unknown).
    pub fn dependencies_of(&self, id: TaskId) -> &[TaskId] {
        self.dependencies.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Whether any task has at least one dependency.
    pub fn has_edges(&self) -> bool {
        self.dependencies.values().any(|deps| !deps.is_empty())
    }
}

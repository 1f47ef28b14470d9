//! Dependency graph construction.
//!
//! Building a graph is split in two: a [`DependencyPolicy`] decides which
//! subtask waits for which, and the pure functions in [`algorithms`] derive
//! ordering, cycle and grouping information from the resulting map.

/// Ordering, cycle detection and grouping over dependency maps.
pub mod algorithms;
/// Dependency inference policies.
pub mod inference;

use heydav_core::{DependencyMap, TaskBreakdown, TaskDependencyGraph, TaskId};
use tracing::{debug, warn};

pub use algorithms::{has_cycle, parallel_groups, topological_order};
pub use inference::{DeclaredDependencies, KeywordIntentPolicy};

/// Decides which subtasks depend on which.
pub trait DependencyPolicy: Send + Sync {
    /// Dependencies for every task in `tasks` (tasks without any map to an empty list).
    fn infer(&self, tasks: &[TaskBreakdown]) -> DependencyMap;
}

/// Builds [`TaskDependencyGraph`]s from subtasks with a pluggable policy.
pub struct DependencyGraphBuilder {
    policy: Box<dyn DependencyPolicy>,
}

impl Default for DependencyGraphBuilder {
    fn default() -> Self {
        Self::new(KeywordIntentPolicy::default())
    }
}

impl DependencyGraphBuilder {
    /// Creates a builder using `policy` for inference.
    pub fn new(policy: impl DependencyPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Infers dependencies and derives order, groups and cycle flag.
    pub fn build(&self, tasks: &[TaskBreakdown]) -> TaskDependencyGraph {
        let dependencies = self.policy.infer(tasks);
        let nodes: Vec<TaskId> = tasks.iter().map(|task| task.id).collect();

        let has_circular_dependency = has_cycle(&dependencies);
        if has_circular_dependency {
            warn!("Dependency cycle detected among {} subtasks", nodes.len());
        }

        let graph = TaskDependencyGraph {
            execution_order: topological_order(&nodes, &dependencies),
            parallel_groups: parallel_groups(&nodes, &dependencies),
            dependencies,
            has_circular_dependency,
        };
        debug!(
            "Built dependency graph: {} tasks, {} parallel groups",
            nodes.len(),
            graph.parallel_groups.len()
        );
        graph
    }

    /// Copies each task's inferred dependencies onto the task itself.
    pub fn attach_dependencies(tasks: &mut [TaskBreakdown], graph: &TaskDependencyGraph) {
        for task in tasks {
            task.dependencies = graph.dependencies_of(task.id).to_vec();
        }
    }
}

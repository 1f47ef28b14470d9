use std::collections::{HashMap, HashSet};

use heydav_core::{DependencyMap, TaskId};
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef as _;
use petgraph::{Direction, algo};

/// Dependency graph over the tasks of one batch, used to form execution waves.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraph<TaskId, ()>,
}

impl TaskGraph {
    /// Builds the graph; dependencies outside `tasks` are ignored.
    #[must_use]
    pub fn from_dependencies(tasks: &[TaskId], dependencies: &DependencyMap) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for task in tasks {
            let node = graph.add_node(*task);
            node_map.insert(*task, node);
        }

        for task in tasks {
            let task_node = node_map[task];
            for dep_id in dependencies.get(task).into_iter().flatten() {
                if let Some(&dep_node) = node_map.get(dep_id) {
                    graph.add_edge(dep_node, task_node, ());
                }
            }
        }

        Self { graph }
    }

    /// Tasks not yet completed whose dependencies all are.
    #[must_use]
    pub fn ready_tasks(&self, completed: &HashSet<TaskId>) -> Vec<TaskId> {
        self.graph
            .node_indices()
            .filter_map(|node| {
                let task = self.graph[node];
                if completed.contains(&task) {
                    return None;
                }

                let deps_satisfied = self
                    .graph
                    .edges_directed(node, Direction::Incoming)
                    .all(|edge| completed.contains(&self.graph[edge.source()]));

                deps_satisfied.then_some(task)
            })
            .collect()
    }

    /// Detect cycles (no wave order exists)
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        algo::is_cyclic_directed(&self.graph)
    }

    /// Number of tasks in the graph.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }
}

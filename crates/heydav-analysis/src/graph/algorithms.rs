//! Pure graph algorithms over [`DependencyMap`]s.
//!
//! Maps are `task → tasks it depends on`. Node lists fix the visiting order
//! so results are deterministic for a given input.

use std::collections::{HashMap, HashSet};

use heydav_core::{DependencyMap, TaskId};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Temporary,
    Permanent,
}

/// Dependency-first ordering of `nodes`.
///
/// Depth-first search runs over dependency → dependent edges in node order;
/// the post-order is reversed at the end. A node reached again while still
/// on the current path closes a cycle and is not explored twice, so every
/// node appears exactly once even for cyclic input. Dependencies that are not
/// in `nodes` are ignored.
pub fn topological_order(nodes: &[TaskId], dependencies: &DependencyMap) -> Vec<TaskId> {
    let known: HashSet<TaskId> = nodes.iter().copied().collect();
    let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for node in nodes {
        for dependency in dependencies.get(node).into_iter().flatten() {
            if known.contains(dependency) {
                dependents.entry(*dependency).or_default().push(*node);
            }
        }
    }

    let mut marks = HashMap::with_capacity(nodes.len());
    let mut post_order = Vec::with_capacity(nodes.len());
    for node in nodes {
        visit_dependents(*node, &dependents, &mut marks, &mut post_order);
    }
    post_order.reverse();
    post_order
}

fn visit_dependents(
    node: TaskId,
    dependents: &HashMap<TaskId, Vec<TaskId>>,
    marks: &mut HashMap<TaskId, Mark>,
    post_order: &mut Vec<TaskId>,
) {
    if marks.contains_key(&node) {
        return;
    }
    marks.insert(node, Mark::Temporary);
    for dependent in dependents.get(&node).into_iter().flatten() {
        visit_dependents(*dependent, dependents, marks, post_order);
    }
    marks.insert(node, Mark::Permanent);
    post_order.push(node);
}

/// Whether `dependencies` contains a directed cycle.
pub fn has_cycle(dependencies: &DependencyMap) -> bool {
    let mut marks: HashMap<TaskId, Mark> = HashMap::with_capacity(dependencies.len());
    dependencies
        .keys()
        .any(|node| reaches_open_node(*node, dependencies, &mut marks))
}

fn reaches_open_node(
    node: TaskId,
    dependencies: &DependencyMap,
    marks: &mut HashMap<TaskId, Mark>,
) -> bool {
    match marks.get(&node) {
        Some(Mark::Temporary) => return true,
        Some(Mark::Permanent) => return false,
        None => {}
    }

    marks.insert(node, Mark::Temporary);
    for dependency in dependencies.get(&node).into_iter().flatten() {
        if reaches_open_node(*dependency, dependencies, marks) {
            return true;
        }
    }
    marks.insert(node, Mark::Permanent);
    false
}

/// Greedy partition of `nodes` into groups with no dependency edge inside a group.
///
/// Each unassigned node seeds a group; later unassigned nodes join it when
/// they neither depend on nor are depended on by any current member. Groups
/// say nothing about ordering between groups.
pub fn parallel_groups(nodes: &[TaskId], dependencies: &DependencyMap) -> Vec<Vec<TaskId>> {
    let depends_on = |task: TaskId, other: TaskId| {
        dependencies
            .get(&task)
            .is_some_and(|deps| deps.contains(&other))
    };

    let mut assigned: HashSet<TaskId> = HashSet::with_capacity(nodes.len());
    let mut groups = Vec::new();

    for (index, seed) in nodes.iter().enumerate() {
        if !assigned.insert(*seed) {
            continue;
        }
        let mut group = vec![*seed];

        for candidate in &nodes[index + 1..] {
            if assigned.contains(candidate) {
                continue;
            }
            let independent = group
                .iter()
                .all(|member| !depends_on(*candidate, *member) && !depends_on(*member, *candidate));
            if independent {
                assigned.insert(*candidate);
                group.push(*candidate);
            }
        }

        groups.push(group);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(count: usize) -> Vec<TaskId> {
        (0..count).map(|_| TaskId::default()).collect()
    }

    fn map(edges: &[(TaskId, TaskId)], nodes: &[TaskId]) -> DependencyMap {
        let mut deps: DependencyMap = nodes.iter().map(|node| (*node, Vec::new())).collect();
        for (task, dependency) in edges {
            deps.entry(*task).or_default().push(*dependency);
        }
        deps
    }

    /// Deterministic pseudo-random sequence for generated graphs.
    struct Lcg(u64);

    impl Lcg {
        fn next_value(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }
    }

    fn random_dag(size: usize, seed: u64) -> (Vec<TaskId>, DependencyMap) {
        let nodes = ids(size);
        let mut rng = Lcg(seed);
        let mut edges = Vec::new();
        for later in 1..size {
            for earlier in 0..later {
                if rng.next_value() % 3 == 0 {
                    edges.push((nodes[later], nodes[earlier]));
                }
            }
        }
        // Shuffle visiting order so the input order is not already topological.
        let mut shuffled = nodes.clone();
        for index in (1..shuffled.len()).rev() {
            let swap = (rng.next_value() as usize) % (index + 1);
            shuffled.swap(index, swap);
        }
        let deps = map(&edges, &nodes);
        (shuffled, deps)
    }

    fn transitive_dependencies(node: TaskId, deps: &DependencyMap) -> HashSet<TaskId> {
        let mut seen = HashSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            for dependency in deps.get(&current).into_iter().flatten() {
                if seen.insert(*dependency) {
                    stack.push(*dependency);
                }
            }
        }
        seen
    }

    #[test]
    fn test_chain_orders_dependencies_first() {
        let nodes = ids(3);
        let deps = map(&[(nodes[2], nodes[1]), (nodes[1], nodes[0])], &nodes);
        let reversed: Vec<TaskId> = nodes.iter().rev().copied().collect();

        assert_eq!(topological_order(&reversed, &deps), nodes);
    }

    #[test]
    fn test_order_respects_transitive_dependencies() {
        for seed in 1..40_u64 {
            let (nodes, deps) = random_dag(9, seed);
            let order = topological_order(&nodes, &deps);
            assert_eq!(order.len(), nodes.len());

            let position: HashMap<TaskId, usize> =
                order.iter().enumerate().map(|(index, id)| (*id, index)).collect();
            for node in &nodes {
                for dependency in transitive_dependencies(*node, &deps) {
                    assert!(
                        position[&dependency] < position[node],
                        "seed {seed}: dependency scheduled after dependent"
                    );
                }
            }
        }
    }

    #[test]
    fn test_two_node_cycle() {
        let nodes = ids(2);
        let deps = map(&[(nodes[0], nodes[1]), (nodes[1], nodes[0])], &nodes);
        assert!(has_cycle(&deps));
        assert_eq!(topological_order(&nodes, &deps).len(), 2);
    }

    #[test]
    fn test_three_node_cycle() {
        let nodes = ids(3);
        let deps = map(
            &[(nodes[0], nodes[1]), (nodes[1], nodes[2]), (nodes[2], nodes[0])],
            &nodes,
        );
        assert!(has_cycle(&deps));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let nodes = ids(1);
        let deps = map(&[(nodes[0], nodes[0])], &nodes);
        assert!(has_cycle(&deps));
    }

    #[test]
    fn test_acyclic_graphs_have_no_cycle() {
        let nodes = ids(4);
        let diamond = map(
            &[
                (nodes[1], nodes[0]),
                (nodes[2], nodes[0]),
                (nodes[3], nodes[1]),
                (nodes[3], nodes[2]),
            ],
            &nodes,
        );
        assert!(!has_cycle(&diamond));

        for seed in 1..20_u64 {
            let (_, deps) = random_dag(8, seed);
            assert!(!has_cycle(&deps), "seed {seed}");
        }
    }

    #[test]
    fn test_unknown_dependencies_are_ignored() {
        let nodes = ids(2);
        let outsider = TaskId::default();
        let deps = map(&[(nodes[1], outsider)], &nodes);

        let order = topological_order(&nodes, &deps);
        assert_eq!(order.len(), 2);
        assert!(!order.contains(&outsider));
    }

    #[test]
    fn test_groups_never_contain_an_edge() {
        for seed in 1..40_u64 {
            let (nodes, deps) = random_dag(10, seed);
            let groups = parallel_groups(&nodes, &deps);

            let grouped: usize = groups.iter().map(Vec::len).sum();
            assert_eq!(grouped, nodes.len());

            for group in &groups {
                for task in group {
                    for other in group {
                        let edge = deps[task].contains(other);
                        assert!(!edge, "seed {seed}: edge inside a parallel group");
                    }
                }
            }
        }
    }

    #[test]
    fn test_independent_tasks_share_one_group() {
        let nodes = ids(3);
        let deps = map(&[], &nodes);
        assert_eq!(parallel_groups(&nodes, &deps), vec![nodes]);
    }
}

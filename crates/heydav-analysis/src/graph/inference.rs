use heydav_core::{DependencyMap, Intent, TaskBreakdown, TaskId};

use super::DependencyPolicy;

/// Infers dependencies from ordering words and intents.
///
/// A task mentioning one of the ordering keywords waits for every task with a
/// strictly higher priority. Update and delete tasks wait for every create task.
#[derive(Debug, Clone)]
pub struct KeywordIntentPolicy {
    ordering_keywords: Vec<String>,
}

impl Default for KeywordIntentPolicy {
    fn default() -> Self {
        Self {
            ordering_keywords: vec!["after".to_owned(), "then".to_owned(), "once".to_owned()],
        }
    }
}

impl KeywordIntentPolicy {
    /// Replaces the ordering keywords (matched as lowercase substrings).
    #[must_use]
    pub fn with_ordering_keywords(mut self, keywords: Vec<String>) -> Self {
        self.ordering_keywords = keywords
            .into_iter()
            .map(|keyword| keyword.to_lowercase())
            .collect();
        self
    }

    fn mentions_ordering(&self, description: &str) -> bool {
        let lowered = description.to_lowercase();
        self.ordering_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}

impl DependencyPolicy for KeywordIntentPolicy {
    fn infer(&self, tasks: &[TaskBreakdown]) -> DependencyMap {
        tasks
            .iter()
            .map(|task| {
                let mut dependencies: Vec<TaskId> = Vec::new();
                let mut add = |id: TaskId| {
                    if id != task.id && !dependencies.contains(&id) {
                        dependencies.push(id);
                    }
                };

                if self.mentions_ordering(&task.description) {
                    tasks
                        .iter()
                        .filter(|other| other.priority > task.priority)
                        .for_each(|other| add(other.id));
                }

                if matches!(task.intent, Intent::Update | Intent::Delete) {
                    tasks
                        .iter()
                        .filter(|other| other.intent == Intent::Create)
                        .for_each(|other| add(other.id));
                }

                (task.id, dependencies)
            })
            .collect()
    }
}

/// Uses the dependencies already recorded on each task.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredDependencies;

impl DependencyPolicy for DeclaredDependencies {
    fn infer(&self, tasks: &[TaskBreakdown]) -> DependencyMap {
        tasks
            .iter()
            .map(|task| (task.id, task.dependencies.clone()))
            .collect()
    }
}

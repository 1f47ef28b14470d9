use core::time::Duration;
use std::sync::LazyLock;

use heydav_core::{Complexity, Intent, TaskBreakdown};
use regex::Regex;
use tracing::debug;

use super::agents::AgentCatalog;
use super::complexity::ComplexityEstimator;
use super::entities::EntityExtractor;
use super::intent::IntentClassifier;

static SEQUENCE_KEYWORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)\b(?:first|then|next|after|finally)\b") {
        Ok(regex) => regex,
        Err(err) => panic!("Sequence regex is invalid: {err}"),
    });

/// Expected run time of one subtask of the given tier.
pub fn subtask_duration(complexity: Complexity) -> Duration {
    match complexity {
        Complexity::Simple => Duration::from_secs(30),
        Complexity::Moderate => Duration::from_secs(2 * 60),
        Complexity::Complex => Duration::from_secs(5 * 60),
        Complexity::Advanced => Duration::from_secs(15 * 60),
    }
}

/// Decomposes commands into ordered subtasks.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskDecomposer {
    intents: IntentClassifier,
    complexity: ComplexityEstimator,
    entities: EntityExtractor,
    agents: AgentCatalog,
}

impl TaskDecomposer {
    /// Splits `command` into subtasks.
    ///
    /// Simple commands stay whole. Otherwise the command is split on
    /// `" and "` and on sequencing words; when neither applies, an
    /// intent-specific template is used. Priorities count down from the
    /// number of subtasks so earlier subtasks rank higher.
    pub fn decompose(
        &self,
        command: &str,
        intent: Intent,
        complexity: Complexity,
    ) -> Vec<TaskBreakdown> {
        let mut subtasks = if complexity == Complexity::Simple {
            vec![TaskBreakdown::new(command, intent).with_complexity(complexity)]
        } else {
            let mut split: Vec<TaskBreakdown> = Self::conjunction_parts(command)
                .into_iter()
                .map(|part| self.subtask(part))
                .collect();
            split.extend(
                Self::sequential_parts(command)
                    .into_iter()
                    .map(|part| self.subtask(part).sequential()),
            );

            if split.is_empty() {
                Self::template(command, intent)
            } else {
                split
            }
        };

        let count = subtasks.len();
        for (index, subtask) in subtasks.iter_mut().enumerate() {
            subtask.priority = i32::try_from(count - index).unwrap_or(i32::MAX);
            subtask.estimated_duration = subtask_duration(subtask.complexity);
            subtask.required_agents = self.agents.required_agents(&subtask.description);
            subtask.parameters = self.entities.parameters(&subtask.description);
        }

        debug!("Decomposed command into {} subtasks", count);
        subtasks
    }

    fn subtask(&self, description: &str) -> TaskBreakdown {
        TaskBreakdown::new(description, self.intents.classify(description))
            .with_complexity(self.complexity.estimate(description))
    }

    /// Parts separated by a literal `" and "`, only when there is more than one.
    fn conjunction_parts(command: &str) -> Vec<&str> {
        if !command.contains(" and ") {
            return Vec::new();
        }
        command
            .split(" and ")
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Text following each sequencing word up to the next one (or the end).
    fn sequential_parts(command: &str) -> Vec<&str> {
        let keywords: Vec<_> = SEQUENCE_KEYWORD_REGEX.find_iter(command).collect();
        keywords
            .iter()
            .enumerate()
            .filter_map(|(index, keyword)| {
                let rest = &command[keyword.end()..];
                if !rest.starts_with(char::is_whitespace) {
                    return None;
                }
                let end = keywords
                    .get(index + 1)
                    .map_or(command.len(), |next| next.start());
                let part = command[keyword.end()..end].trim();
                (!part.is_empty()).then_some(part)
            })
            .collect()
    }

    fn template(command: &str, intent: Intent) -> Vec<TaskBreakdown> {
        let main = TaskBreakdown::new(command, intent);
        match intent {
            Intent::Create => vec![
                TaskBreakdown::new("Validate input parameters", Intent::Validate),
                main,
                TaskBreakdown::new("Verify creation result", Intent::Validate),
            ],
            Intent::Update => vec![
                TaskBreakdown::new("Fetch current state", Intent::Read),
                main,
                TaskBreakdown::new("Verify update result", Intent::Validate),
            ],
            Intent::Delete => vec![
                TaskBreakdown::new("Verify item exists", Intent::Read),
                TaskBreakdown::new("Create backup if needed", Intent::Backup),
                main,
            ],
            _ => vec![main],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptions(tasks: &[TaskBreakdown]) -> Vec<&str> {
        tasks.iter().map(|task| task.description.as_str()).collect()
    }

    #[test]
    fn test_simple_command_stays_whole() {
        let tasks = TaskDecomposer::default().decompose("weather", Intent::Unknown, Complexity::Simple);
        assert_eq!(descriptions(&tasks), vec!["weather"]);
        assert_eq!(tasks[0].priority, 1);
        assert_eq!(tasks[0].estimated_duration, Duration::from_secs(30));
    }

    #[test]
    fn test_conjunction_and_sequence_split() {
        let command = "Create a new project and then update the roadmap";
        let tasks = TaskDecomposer::default().decompose(command, Intent::Create, Complexity::Moderate);

        assert_eq!(
            descriptions(&tasks),
            vec!["Create a new project", "then update the roadmap", "update the roadmap"]
        );
        assert_eq!(
            tasks.iter().map(|task| task.priority).collect::<Vec<_>>(),
            vec![3, 2, 1]
        );
        assert!(tasks[0].can_run_in_parallel);
        assert!(!tasks[2].can_run_in_parallel);
        assert_eq!(tasks[2].intent, Intent::Update);
    }

    #[test]
    fn test_sequence_runs_to_end_of_command() {
        let parts = TaskDecomposer::sequential_parts("first book flights then reserve hotel finally pack");
        assert_eq!(parts, vec!["book flights", "reserve hotel", "pack"]);
    }

    #[test]
    fn test_sequence_keyword_needs_following_text() {
        assert!(TaskDecomposer::sequential_parts("do it after").is_empty());
        assert!(TaskDecomposer::sequential_parts("thereafter nothing").is_empty());
    }

    #[test]
    fn test_delete_template() {
        let tasks = TaskDecomposer::default().decompose(
            "delete all files",
            Intent::Delete,
            Complexity::Moderate,
        );

        assert_eq!(
            descriptions(&tasks),
            vec!["Verify item exists", "Create backup if needed", "delete all files"]
        );
        assert_eq!(tasks[1].intent, Intent::Backup);
        assert_eq!(tasks[2].intent, Intent::Delete);
        assert_eq!(tasks[2].required_agents, vec!["FileAgent".to_owned()]);
    }

    #[test]
    fn test_other_intents_use_single_task_template() {
        let tasks = TaskDecomposer::default().decompose(
            "analyze spending",
            Intent::Analyze,
            Complexity::Moderate,
        );
        assert_eq!(descriptions(&tasks), vec!["analyze spending"]);
    }
}

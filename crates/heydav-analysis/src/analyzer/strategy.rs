use core::time::Duration;

use heydav_core::{
    Complexity, ExecutionMode, ExecutionStrategy, Intent, TaskAnalysisResult, TaskBreakdown,
};

/// Check name: every required agent must have a matching processor.
pub const VERIFY_AGENT_AVAILABILITY: &str = "VerifyAgentAvailability";
/// Check name: the plan contains a delete.
pub const CONFIRM_DESTRUCTIVE_OPERATIONS: &str = "ConfirmDestructiveOperations";

const MINUTE: u64 = 60;

/// Derives execution strategy, duration and confidence from an analysis.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrategyAdvisor;

impl StrategyAdvisor {
    /// Recommended strategy for `analysis`.
    pub fn suggest(&self, analysis: &TaskAnalysisResult) -> ExecutionStrategy {
        let subtasks = &analysis.subtasks;
        let mode = if analysis.dependencies.parallel_groups.len() > 1 {
            ExecutionMode::Hybrid
        } else if subtasks.len() > 1 && subtasks.iter().all(|task| task.can_run_in_parallel) {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        };

        let mut strategy = ExecutionStrategy::new(mode)
            .with_max_parallel(Self::max_parallel(analysis.complexity))
            .with_timeout(Self::timeout_for(analysis.estimated_duration));
        strategy.requires_human_approval = analysis.complexity == Complexity::Advanced
            || analysis.estimated_duration > Duration::from_secs(30 * MINUTE);

        if analysis.required_agents.len() > 1 {
            strategy = strategy.with_check(VERIFY_AGENT_AVAILABILITY);
        }
        if subtasks.iter().any(|task| task.intent == Intent::Delete) {
            strategy = strategy.with_check(CONFIRM_DESTRUCTIVE_OPERATIONS);
        }
        strategy
    }

    /// Base time for the tier plus every subtask estimate.
    pub fn estimate_duration(&self, complexity: Complexity, subtasks: &[TaskBreakdown]) -> Duration {
        let base = match complexity {
            Complexity::Simple => Duration::from_secs(MINUTE),
            Complexity::Moderate => Duration::from_secs(5 * MINUTE),
            Complexity::Complex => Duration::from_secs(15 * MINUTE),
            Complexity::Advanced => Duration::from_secs(30 * MINUTE),
        };
        subtasks
            .iter()
            .map(|task| task.estimated_duration)
            .fold(base, |total, duration| total + duration)
    }

    /// Confidence in an analysis, between 0.5 and 1.0.
    pub fn confidence(&self, intent: Intent, entity_count: usize, parameter_count: usize) -> f32 {
        let mut confidence = 0.5_f32;
        if intent != Intent::Unknown {
            confidence += 0.2;
        }
        confidence += (entity_count as f32 * 0.1).min(0.2);
        confidence += (parameter_count as f32 * 0.05).min(0.1);
        confidence.min(1.0)
    }

    fn max_parallel(complexity: Complexity) -> usize {
        match complexity {
            Complexity::Simple => 1,
            Complexity::Moderate => 2,
            Complexity::Complex => 3,
            Complexity::Advanced => 5,
        }
    }

    fn timeout_for(estimated: Duration) -> Duration {
        let minutes = if estimated < Duration::from_secs(MINUTE) {
            2
        } else if estimated < Duration::from_secs(5 * MINUTE) {
            10
        } else if estimated < Duration::from_secs(15 * MINUTE) {
            30
        } else {
            60
        };
        Duration::from_secs(minutes * MINUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bounds() {
        let advisor = StrategyAdvisor;
        assert!((advisor.confidence(Intent::Unknown, 0, 0) - 0.5).abs() < f32::EPSILON);
        assert!((advisor.confidence(Intent::Create, 1, 1) - 0.85).abs() < 1e-5);
        assert!((advisor.confidence(Intent::Create, 10, 10) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(
            StrategyAdvisor::timeout_for(Duration::from_secs(30)),
            Duration::from_secs(2 * MINUTE)
        );
        assert_eq!(
            StrategyAdvisor::timeout_for(Duration::from_secs(6 * MINUTE + 30)),
            Duration::from_secs(30 * MINUTE)
        );
        assert_eq!(
            StrategyAdvisor::timeout_for(Duration::from_secs(45 * MINUTE)),
            Duration::from_secs(60 * MINUTE)
        );
    }

    #[test]
    fn test_duration_adds_subtasks_to_base() {
        let subtasks = vec![
            TaskBreakdown::new("one", Intent::Read),
            TaskBreakdown::new("two", Intent::Read),
        ]
        .into_iter()
        .map(|mut task| {
            task.estimated_duration = Duration::from_secs(30);
            task
        })
        .collect::<Vec<_>>();

        assert_eq!(
            StrategyAdvisor.estimate_duration(Complexity::Moderate, &subtasks),
            Duration::from_secs(6 * MINUTE)
        );
    }
}

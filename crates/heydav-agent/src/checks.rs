//! Named checks that gate execution of an analyzed command.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use heydav_analysis::analyzer::{CONFIRM_DESTRUCTIVE_OPERATIONS, VERIFY_AGENT_AVAILABILITY};
use heydav_core::{ProcessorFactory, TaskAnalysisResult};
use tracing::{debug, warn};

/// A check run before the engine sees a command.
#[async_trait]
pub trait PreExecutionCheck: Send + Sync {
    /// Whether execution may proceed.
    async fn check(&self, analysis: &TaskAnalysisResult) -> bool;
}

/// Every required agent must be served by a registered processor.
///
/// An agent is served when some processor type contains its name, ignoring
/// case and an `Agent` suffix (`TodoAgent` is served by `todo`).
pub struct AgentAvailabilityCheck {
    processors: Arc<dyn ProcessorFactory>,
}

impl AgentAvailabilityCheck {
    /// Creates the check over `processors`.
    pub fn new(processors: Arc<dyn ProcessorFactory>) -> Self {
        Self { processors }
    }

    fn is_served(agent: &str, processor_types: &[String]) -> bool {
        let lowered = agent.to_lowercase();
        let stem = lowered.strip_suffix("agent").unwrap_or(&lowered);
        processor_types
            .iter()
            .any(|processor_type| processor_type.contains(&lowered) || processor_type.contains(stem))
    }
}

#[async_trait]
impl PreExecutionCheck for AgentAvailabilityCheck {
    async fn check(&self, analysis: &TaskAnalysisResult) -> bool {
        let processor_types: Vec<String> = self
            .processors
            .all_processors()
            .iter()
            .map(|processor| processor.processor_type().to_lowercase())
            .collect();

        let missing = analysis
            .required_agents
            .iter()
            .find(|agent| !Self::is_served(agent, &processor_types));
        if let Some(agent) = missing {
            warn!("No processor available for agent {}", agent);
            return false;
        }
        true
    }
}

/// Advisory check for destructive commands; logs and lets them through.
#[derive(Debug, Default, Clone, Copy)]
pub struct DestructiveOperationCheck;

#[async_trait]
impl PreExecutionCheck for DestructiveOperationCheck {
    async fn check(&self, analysis: &TaskAnalysisResult) -> bool {
        warn!(
            "Destructive operation requested: {}",
            analysis.original_command
        );
        true
    }
}

/// Checks by name, as listed in an execution strategy.
#[derive(Clone, Default)]
pub struct PreExecutionChecks {
    checks: HashMap<String, Arc<dyn PreExecutionCheck>>,
}

impl PreExecutionChecks {
    /// The built-in checks, wired to `processors`.
    pub fn with_defaults(processors: Arc<dyn ProcessorFactory>) -> Self {
        let mut checks = Self::default();
        checks.register(
            VERIFY_AGENT_AVAILABILITY,
            Arc::new(AgentAvailabilityCheck::new(processors)),
        );
        checks.register(
            CONFIRM_DESTRUCTIVE_OPERATIONS,
            Arc::new(DestructiveOperationCheck),
        );
        checks
    }

    /// Registers (or replaces) a check.
    pub fn register(&mut self, name: impl Into<String>, check: Arc<dyn PreExecutionCheck>) {
        self.checks.insert(name.into(), check);
    }

    /// Runs the checks named by the analysis' strategy in order.
    ///
    /// Returns the name of the first failing check. Unknown names pass.
    pub async fn first_failure(&self, analysis: &TaskAnalysisResult) -> Option<String> {
        for name in &analysis.suggested_strategy.pre_execution_checks {
            let Some(check) = self.checks.get(name) else {
                warn!("Unknown pre-execution check {}, skipping", name);
                continue;
            };
            if !check.check(analysis).await {
                return Some(name.clone());
            }
            debug!("Pre-execution check {} passed", name);
        }
        None
    }
}

//! Core task types and basic structures

use core::fmt::{Display, Formatter, Result as FmtResult};
use core::time::Duration;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for TaskId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

/// What a command asks the assistant to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intent {
    /// Create something new
    Create,
    /// Generate content
    Generate,
    /// Read or display existing data
    Read,
    /// Change existing data
    Update,
    /// Remove data
    Delete,
    /// Look something up
    Search,
    /// Analyze data
    Analyze,
    /// Run a processing step
    Process,
    /// Convert data between shapes
    Transform,
    /// Plan something for later
    Schedule,
    /// Tell the user something
    Notify,
    /// Run an action
    Execute,
    /// Watch something over time
    Monitor,
    /// Save a copy
    Backup,
    /// Synchronize two sides
    Sync,
    /// Check correctness
    Validate,
    /// Combine several inputs
    Aggregate,
    /// Narrow a collection
    Filter,
    /// Order a collection
    Sort,
    /// Move data out
    Export,
    /// Bring data in
    Import,
    /// No recognizable intent
    #[default]
    Unknown,
}

impl Intent {
    /// Name used in capability lists and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Generate => "Generate",
            Self::Read => "Read",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Search => "Search",
            Self::Analyze => "Analyze",
            Self::Process => "Process",
            Self::Transform => "Transform",
            Self::Schedule => "Schedule",
            Self::Notify => "Notify",
            Self::Execute => "Execute",
            Self::Monitor => "Monitor",
            Self::Backup => "Backup",
            Self::Sync => "Sync",
            Self::Validate => "Validate",
            Self::Aggregate => "Aggregate",
            Self::Filter => "Filter",
            Self::Sort => "Sort",
            Self::Export => "Export",
            Self::Import => "Import",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the intent removes data.
    pub fn is_destructive(self) -> bool {
        self == Self::Delete
    }
}

impl Display for Intent {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        formatter.write_str(self.as_str())
    }
}

/// Ordered complexity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
    /// One step, no coordination
    #[default]
    Simple,
    /// A few steps
    Moderate,
    /// Many steps or conditions
    Complex,
    /// Large, multi-stage work
    Advanced,
}

impl Display for Complexity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Simple => "Simple",
            Self::Moderate => "Moderate",
            Self::Complex => "Complex",
            Self::Advanced => "Advanced",
        };
        formatter.write_str(name)
    }
}

/// One subtask produced by decomposing a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBreakdown {
    /// Unique identifier
    pub id: TaskId,
    /// Subtask text
    pub description: String,
    /// Classified intent
    pub intent: Intent,
    /// Estimated complexity
    pub complexity: Complexity,
    /// Agents whose keywords appear in the description
    pub required_agents: Vec<String>,
    /// Tasks that must finish first
    pub dependencies: Vec<TaskId>,
    /// Parameters extracted from the description
    pub parameters: HashMap<String, Value>,
    /// Higher runs earlier
    pub priority: i32,
    /// Expected run time
    pub estimated_duration: Duration,
    /// Whether the task may share a wave with others
    pub can_run_in_parallel: bool,
}

impl TaskBreakdown {
    /// Creates a parallel-eligible breakdown with default settings.
    pub fn new(description: impl Into<String>, intent: Intent) -> Self {
        Self {
            id: TaskId::default(),
            description: description.into(),
            intent,
            complexity: Complexity::default(),
            required_agents: Vec::default(),
            dependencies: Vec::default(),
            parameters: HashMap::default(),
            priority: 0,
            estimated_duration: Duration::ZERO,
            can_run_in_parallel: true,
        }
    }

    /// Sets the complexity tier.
    #[must_use]
    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets the required agents.
    #[must_use]
    pub fn with_agents(mut self, agents: Vec<String>) -> Self {
        self.required_agents = agents;
        self
    }

    /// Marks the task as order-sensitive.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.can_run_in_parallel = false;
        self
    }
}

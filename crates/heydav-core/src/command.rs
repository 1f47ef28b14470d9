//! Command requests and results exchanged with command processors.

use core::time::Duration;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Urgency attached to an incoming command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CommandPriority {
    /// Background work
    Low,
    /// Regular interactive command
    #[default]
    Normal,
    /// Needs attention soon
    High,
    /// Needs attention now
    Critical,
}

/// Follow-up the caller is expected to take with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandAction {
    /// Nothing further to do
    None,
    /// Show the result to the user
    Display,
    /// Ask the user a question (approval, clarification)
    Query,
    /// Hand the result to another command
    Chain,
}

/// A free-text command submitted to the pipeline.
///
/// Requests are immutable once built; the `with_*` builders consume and
/// return the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Raw command text
    pub command: String,
    /// Where the command came from (cli, voice, orchestrator...)
    pub source: String,
    /// Free-form context forwarded to processors
    pub context: HashMap<String, Value>,
    /// Named string parameters
    pub parameters: HashMap<String, String>,
    /// Explicit processor to use, bypassing best-match selection
    pub processor_type: Option<String>,
    /// Urgency
    pub priority: CommandPriority,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl CommandRequest {
    /// Creates a request for `command` coming from `source`.
    pub fn new(command: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            source: source.into(),
            context: HashMap::default(),
            parameters: HashMap::default(),
            processor_type: None,
            priority: CommandPriority::default(),
            timestamp: Utc::now(),
        }
    }

    /// Replaces the context map.
    #[must_use]
    pub fn with_context(mut self, context: HashMap<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Adds a single string parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Routes the request to a specific processor type.
    #[must_use]
    pub fn with_processor_type(mut self, processor_type: impl Into<String>) -> Self {
        self.processor_type = Some(processor_type.into());
        self
    }

    /// Sets the urgency.
    #[must_use]
    pub fn with_priority(mut self, priority: CommandPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Whether the command text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.command.trim().is_empty()
    }
}

/// Outcome of processing one command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command succeeded
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    /// Structured payload
    pub data: Option<Value>,
    /// Wall-clock processing time
    pub processing_time: Duration,
    /// Processor that produced the result
    pub processor_used: Option<String>,
    /// Suggested follow-up
    pub action: Option<CommandAction>,
    /// Extra key/value information
    pub metadata: HashMap<String, Value>,
}

impl CommandResult {
    /// Creates a successful result.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Creates a failed result.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Records which processor produced the result.
    #[must_use]
    pub fn with_processor(mut self, processor: impl Into<String>) -> Self {
        self.processor_used = Some(processor.into());
        self
    }

    /// Sets the suggested follow-up.
    #[must_use]
    pub fn with_action(mut self, action: CommandAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Sets the processing time.
    #[must_use]
    pub fn with_processing_time(mut self, processing_time: Duration) -> Self {
        self.processing_time = processing_time;
        self
    }
}

/// What a processor or plugin can handle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandCapabilities {
    /// Command patterns, a trailing `*` matches any remainder
    pub supported_commands: Vec<String>,
    /// Sources the processor accepts (empty means any)
    pub supported_sources: Vec<String>,
    /// Short description
    pub description: String,
    /// Example commands
    pub examples: Vec<String>,
    /// Whether the processor needs request context
    pub requires_context: bool,
    /// Whether the processor can stream partial results
    pub supports_streaming: bool,
}

impl CommandCapabilities {
    /// Creates capabilities with the given command patterns.
    pub fn new(supported_commands: Vec<String>, description: impl Into<String>) -> Self {
        Self {
            supported_commands,
            description: description.into(),
            ..Self::default()
        }
    }

    /// Length of the longest supported pattern matching `command`, if any.
    ///
    /// Patterns compare case-insensitively against the start of the command;
    /// a trailing `*` allows any remainder, otherwise the whole command must match.
    pub fn match_strength(&self, command: &str) -> Option<usize> {
        let lowered = command.trim().to_lowercase();
        self.supported_commands
            .iter()
            .filter_map(|pattern| {
                let pattern = pattern.trim().to_lowercase();
                let matched = pattern.strip_suffix('*').map_or_else(
                    || lowered == pattern,
                    |prefix| lowered.starts_with(prefix.trim_end()),
                );
                matched.then_some(pattern.len())
            })
            .max()
    }
}

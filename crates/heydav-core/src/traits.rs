//! Collaborators the pipeline consumes but does not implement.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::command::{CommandCapabilities, CommandRequest, CommandResult};

/// Handles commands of one kind (todos, schedules, general chat...).
#[async_trait]
pub trait CommandProcessor: Send + Sync {
    /// Type name used for routing (`"todo"`, `"schedule"`, `"general"`...).
    fn processor_type(&self) -> &str;

    /// What this processor can handle.
    fn capabilities(&self) -> CommandCapabilities;

    /// Processes one command.
    ///
    /// # Errors
    /// Returns an error if the processor cannot handle the command.
    async fn process(&self, request: &CommandRequest) -> Result<CommandResult>;
}

/// Looks up command processors.
pub trait ProcessorFactory: Send + Sync {
    /// Processor registered under `processor_type`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ProcessorNotFound`] when the type is unknown.
    fn get_processor(&self, processor_type: &str) -> Result<Arc<dyn CommandProcessor>>;

    /// Processor best suited to `command`.
    ///
    /// # Errors
    /// Returns [`crate::Error::NoProcessorAvailable`] when nothing is registered.
    fn get_best_processor(&self, command: &str) -> Result<Arc<dyn CommandProcessor>>;

    /// Every registered processor.
    fn all_processors(&self) -> Vec<Arc<dyn CommandProcessor>>;
}

/// Capabilities advertised by a plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginCapabilities {
    /// Commands the plugin understands
    pub supported_commands: Vec<String>,
    /// Short description
    pub description: String,
}

/// An externally loaded extension.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name.
    fn name(&self) -> &str;

    /// What the plugin can handle.
    ///
    /// # Errors
    /// Returns an error if the plugin cannot report its capabilities.
    async fn capabilities(&self) -> Result<PluginCapabilities>;

    /// Runs a plugin command.
    ///
    /// # Errors
    /// Returns an error if the plugin fails.
    async fn execute(
        &self,
        command: &str,
        parameters: &HashMap<String, Value>,
    ) -> Result<CommandResult>;
}

/// Source of loaded plugins.
#[async_trait]
pub trait PluginManager: Send + Sync {
    /// Currently loaded plugins.
    async fn loaded_plugins(&self) -> Vec<Arc<dyn Plugin>>;
}

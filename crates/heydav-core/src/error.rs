use core::result::Result as CoreResult;
use core::time::Duration;
use std::io::Error as IoError;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;
use toml::ser::Error as TomlSerializeError;

use crate::task::TaskId;

/// Result type for pipeline operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur anywhere in the command pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// TOML serialization failed.
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] TomlSerializeError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The submitted command was empty or whitespace.
    #[error("Command cannot be empty")]
    EmptyCommand,

    /// No processor is registered under the requested type.
    #[error("Processor not found: {0}")]
    ProcessorNotFound(String),

    /// No registered processor can handle the command.
    #[error("No processor available for command: {0}")]
    NoProcessorAvailable(String),

    /// A command processor reported a failure.
    #[error("Processor error: {0}")]
    Processor(String),

    /// Retrying a finished task is not available.
    #[error("Retry is not supported (task {0})")]
    RetryUnsupported(TaskId),

    /// A task exceeded its deadline.
    #[error("Task timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Determines whether this error may succeed if retried.
    ///
    /// Returns `true` for processor failures and timeouts.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Processor(_) | Self::Timeout(_))
    }
}

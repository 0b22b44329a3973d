//! Error types for the companion collaborators.

use thiserror::Error;

/// Errors while persisting plans and reminders.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// Output directory or file could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from a reflection generator.
#[derive(Debug, Error)]
pub enum ReflectionError {
    /// Scores do not belong to the schedule being reflected on.
    #[error("Score for unknown task '{0}'")]
    UnknownTask(String),

    /// Generator-specific failure.
    #[error("Reflection failed: {0}")]
    Generation(String),
}

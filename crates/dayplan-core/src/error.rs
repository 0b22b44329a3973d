//! Core domain errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaskId;

/// Malformed or missing task field, reported per task.
///
/// Validation errors never abort a batch on their own; they are collected
/// and returned next to the tasks that made it through.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid `{field}` for task #{position}: {message}")]
pub struct ValidationError {
    /// 1-based position of the offending task in the sequence the
    /// reporting stage received (the input batch for the normalizer, the
    /// ranked list for the timeline builder).
    pub position: usize,

    /// Id assigned to the record, if normalization got that far.
    pub task_id: Option<TaskId>,

    /// Name of the offending field.
    pub field: String,

    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error for the record at `position`.
    pub fn new(position: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            position,
            task_id: None,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builder method to attach the task id.
    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A scoring weight is not a finite number.
    #[error("Weight '{name}' must be finite, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    /// Category importance outside the allowed range.
    #[error("Importance for category '{category}' must be within 0..=5, got {value}")]
    InvalidImportance { category: String, value: f64 },

    /// Tier thresholds are not ordered.
    #[error("Tier thresholds must satisfy high >= medium, got high={high} medium={medium}")]
    InvalidTierThresholds { high: f64, medium: f64 },

    /// Break bands are empty, unordered or bounded at the end.
    #[error("Invalid break bands: {0}")]
    InvalidBreakBands(String),

    /// Default duration must be positive.
    #[error("Default duration must be positive, got {0}")]
    InvalidDefaultDuration(i64),

    /// Max duration below the default duration or above one week.
    #[error("Max duration must be between the default duration and 10080, got {0}")]
    InvalidMaxDuration(i64),

    /// Reminder lead outside 0..=10080 minutes.
    #[error("Reminder lead '{name}' must be within 0..=10080, got {value}")]
    InvalidReminderLead { name: &'static str, value: i64 },

    /// Max effort must be within the effort scale.
    #[error("Max effort must be within 1..=5, got {0}")]
    InvalidMaxEffort(u8),

    /// Day start is not a valid HH:MM time.
    #[error("Invalid day start '{0}', expected HH:MM")]
    InvalidDayStart(String),
}

/// Raw input that cannot be turned into a batch at all.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// JSON input with an unexpected shape.
    #[error("Unsupported input shape: {0}")]
    UnsupportedShape(String),
}

/// Errors that abort a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage received data violating an upstream guarantee. Indicates a bug.
    #[error("Internal contract violation: {0}")]
    InternalContract(String),

    /// All-or-nothing batch with at least one rejected task.
    #[error("Batch rejected: {} invalid task(s)", .0.len())]
    Rejected(Vec<ValidationError>),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unreadable input.
    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),
}

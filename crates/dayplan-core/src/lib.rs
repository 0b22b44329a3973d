//! Dayplan Core
//!
//! The scheduling and prioritization engine:
//! - intake: raw text or JSON into a batch of raw tasks
//! - normalize: raw tasks into validated [`Task`] values
//! - priority: scoring, tiers and ranking
//! - planner: sequential placement with breaks
//!
//! Everything here is synchronous and free of I/O. Reminders, reviews and
//! rendering live in `dayplan-companion`.

pub mod config;
pub mod dates;
pub mod error;
pub mod ids;
pub mod intake;
pub mod normalize;
pub mod pipeline;
pub mod planner;
pub mod priority;
pub mod schedule;
pub mod task;
pub mod tier;

// Re-export commonly used types
pub use config::{BreakBand, DayplanConfig, ReminderLeads, ScoringWeights, TierThresholds};
pub use error::{ConfigError, IntakeError, PipelineError, ValidationError};
pub use ids::{SessionId, TaskId};
pub use intake::{RawTask, TaskRecord};
pub use normalize::{NormalizedBatch, TaskNormalizer};
pub use pipeline::{BatchPolicy, Pipeline, PlanContext, PlanOutcome};
pub use planner::TimelineBuilder;
pub use priority::{PriorityScorer, PrioritySummary, RankedEntry, RankedTasks};
pub use schedule::{Schedule, ScheduleEntry, SoftWarning};
pub use task::{ScoreBreakdown, Task};
pub use tier::{EntryKind, PriorityTier};

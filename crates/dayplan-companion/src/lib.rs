//! Dayplan Companion
//!
//! Collaborators that consume a finished schedule:
//! - reminder: reminder derivation and on-disk persistence
//! - evaluation: rule-based plan grading
//! - reflection: the [`ReflectionGenerator`] interface
//! - review: end-of-day progress review and re-plan decision
//! - render: plain-text schedule output

pub mod error;
pub mod evaluation;
pub mod reflection;
pub mod reminder;
pub mod render;
pub mod review;

pub use error::{ReflectionError, ReminderError};
pub use evaluation::{evaluate_plan, Grade, PlanEvaluation};
pub use reflection::{ReflectionGenerator, RuleBasedReflector};
pub use reminder::{derive_reminders, PersistedFiles, Reminder, ReminderStore};
pub use render::render_schedule;
pub use review::{review_progress, CompletionStatus, ProgressReview};

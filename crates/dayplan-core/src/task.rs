//! Task types.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{PriorityTier, TaskId};

/// A normalized unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, assigned at normalization time.
    pub id: TaskId,

    /// Non-empty title.
    pub title: String,

    /// Lower-cased category name.
    pub category: String,

    /// Planned length in minutes.
    pub duration_minutes: i64,

    /// Optional deadline; `None` means no deadline pressure.
    pub deadline: Option<DateTime<FixedOffset>>,

    /// Urgency on the 1..=5 scale.
    pub urgency: u8,

    /// Effort on the 1..=5 scale.
    pub effort: u8,

    /// Free-form tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Score assigned by the priority scorer.
    pub score: Option<f64>,

    /// Tier derived from `score`.
    pub priority_tier: Option<PriorityTier>,

    /// Start of the task's slot, set by the timeline builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,

    /// End of the task's slot, set by the timeline builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
}

impl Task {
    /// Create a new unscored Task with mid-range urgency and effort.
    pub fn new(id: TaskId, title: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            id,
            title: title.into(),
            category: crate::config::DEFAULT_CATEGORY.to_string(),
            duration_minutes,
            deadline: None,
            urgency: crate::config::DEFAULT_RATING,
            effort: crate::config::DEFAULT_RATING,
            tags: BTreeSet::new(),
            description: String::new(),
            score: None,
            priority_tier: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Builder method to set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder method to set urgency.
    pub fn with_urgency(mut self, urgency: u8) -> Self {
        self.urgency = urgency;
        self
    }

    /// Builder method to set effort.
    pub fn with_effort(mut self, effort: u8) -> Self {
        self.effort = effort;
        self
    }

    /// Builder method to set the deadline.
    pub fn with_deadline(mut self, deadline: DateTime<FixedOffset>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builder method to add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Planned length as a chrono duration, `None` when out of range.
    pub fn duration(&self) -> Option<Duration> {
        Duration::try_minutes(self.duration_minutes)
    }

    /// Whether the task has passed through the priority scorer.
    pub fn is_scored(&self) -> bool {
        self.score.is_some() && self.priority_tier.is_some()
    }

    /// Whether the task has been placed on the timeline.
    pub fn is_placed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Score and tier are only ever set together.
    pub(crate) fn assign_score(&mut self, score: f64, tier: PriorityTier) {
        self.score = Some(score);
        self.priority_tier = Some(tier);
    }

    pub(crate) fn place(&mut self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) {
        self.start_time = Some(start);
        self.end_time = Some(end);
    }
}

/// Per-task contributions to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub task_id: TaskId,
    pub urgency: f64,
    pub importance: f64,
    pub effort: f64,
    pub deadline: f64,
    pub preference: f64,
    /// Rounded total, equal to the task's `score`.
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new(TaskId::for_position(1), "Write report", 90);
        assert_eq!(task.category, "general");
        assert_eq!(task.urgency, 3);
        assert_eq!(task.effort, 3);
        assert!(!task.is_scored());
        assert!(!task.is_placed());
        assert_eq!(task.duration(), Some(Duration::minutes(90)));
        assert_eq!(
            Task::new(TaskId::for_position(2), "Big", i64::MAX).duration(),
            None
        );
    }

    #[test]
    fn test_assign_score_sets_both_fields() {
        let mut task = Task::new(TaskId::for_position(1), "Walk", 30);
        task.assign_score(1.8, PriorityTier::Low);
        assert!(task.is_scored());
        assert_eq!(task.priority_tier, Some(PriorityTier::Low));
    }

    #[test]
    fn test_tags_serialize_sorted() {
        let task = Task::new(TaskId::for_position(1), "Gym", 45)
            .with_tag("zeta")
            .with_tag("alpha");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["tags"], serde_json::json!(["alpha", "zeta"]));
        assert!(json.get("start_time").is_none());
    }
}

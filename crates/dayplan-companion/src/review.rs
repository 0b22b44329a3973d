//! End-of-day progress review.
//!
//! Compares the planned tasks against the ids the user reports as done and
//! decides whether the remaining work needs a fresh plan.

use std::collections::BTreeSet;
use std::fmt;

use dayplan_core::{PriorityTier, Task, TaskId};
use serde::{Deserialize, Serialize};
use tracing::info;

const REPLAN_BELOW_RATE: f64 = 50.0;
const REPLAN_HIGH_PRIORITY_LEFT: usize = 2;

/// Completion status bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl CompletionStatus {
    /// Bucket a completion rate given in percent.
    pub fn from_rate(rate: f64) -> Self {
        match rate {
            r if r >= 90.0 => CompletionStatus::Excellent,
            r if r >= 70.0 => CompletionStatus::Good,
            r if r >= 50.0 => CompletionStatus::Fair,
            _ => CompletionStatus::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Excellent => "excellent",
            CompletionStatus::Good => "good",
            CompletionStatus::Fair => "fair",
            CompletionStatus::NeedsImprovement => "needs_improvement",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a progress review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReview {
    pub planned: usize,
    pub completed: Vec<TaskId>,
    pub incomplete: Vec<TaskId>,

    /// Percent of planned tasks completed, one decimal.
    pub completion_rate: f64,

    pub status: CompletionStatus,
    pub replan_needed: bool,
    pub reasons: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Review `planned` tasks against the `completed` ids.
///
/// Ids that are not part of the plan are ignored.
pub fn review_progress(planned: &[Task], completed: &BTreeSet<TaskId>) -> ProgressReview {
    let (done, open): (Vec<&Task>, Vec<&Task>) =
        planned.iter().partition(|t| completed.contains(&t.id));

    let completion_rate = if planned.is_empty() {
        0.0
    } else {
        (done.len() as f64 / planned.len() as f64 * 1000.0).round() / 10.0
    };
    let status = CompletionStatus::from_rate(completion_rate);

    let high_left = open
        .iter()
        .filter(|t| t.priority_tier == Some(PriorityTier::High))
        .count();

    let mut reasons = Vec::new();
    if planned.is_empty() {
        reasons.push("No planned tasks to review".to_string());
    } else {
        if completion_rate < REPLAN_BELOW_RATE {
            reasons.push(format!("Low completion rate ({completion_rate}%)"));
        }
        if high_left >= REPLAN_HIGH_PRIORITY_LEFT {
            reasons.push(format!("{high_left} high-priority tasks still open"));
        }
    }
    let replan_needed = !planned.is_empty() && !reasons.is_empty();

    let mut recommendations = Vec::new();
    match status {
        CompletionStatus::NeedsImprovement if !planned.is_empty() => {
            recommendations.push("Consider reducing daily workload or extending deadlines".to_string())
        }
        CompletionStatus::Excellent => {
            recommendations.push("Great job! You can handle slightly more tasks".to_string())
        }
        _ => {}
    }
    if high_left > 0 {
        recommendations.push("Carry open high-priority tasks to the top of the next plan".to_string());
    }

    info!(
        planned = planned.len(),
        completed = done.len(),
        completion_rate,
        replan_needed,
        "Reviewed progress"
    );

    ProgressReview {
        planned: planned.len(),
        completed: done.iter().map(|t| t.id.clone()).collect(),
        incomplete: open.iter().map(|t| t.id.clone()).collect(),
        completion_rate,
        status,
        replan_needed,
        reasons,
        recommendations,
    }
}

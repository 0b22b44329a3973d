//! Task scoring and ranking.
//!
//! ```text
//! score = w_urgency * urgency
//!       + w_importance * category_importance[category]
//!       + w_effort * (max_effort - effort)
//!       + w_deadline * deadline_proximity
//!       + preference_bonus
//! ```
//!
//! Scores are rounded to two decimals, then tasks are stably sorted by
//! descending score so ties keep their input order.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RATING_RANGE;
use crate::{DayplanConfig, PipelineError, PriorityTier, ScoreBreakdown, Task, TaskId};

/// Tasks within this many days of their deadline count as urgent in summaries.
const URGENT_WITHIN_DAYS: f64 = 1.0;

/// Scorer output: tasks in rank order with their breakdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedTasks {
    /// Scored tasks, highest score first.
    pub tasks: Vec<Task>,
    /// Breakdowns, index-aligned with `tasks`.
    pub breakdowns: Vec<ScoreBreakdown>,
}

impl RankedTasks {
    /// Breakdown for a task.
    pub fn breakdown(&self, id: &TaskId) -> Option<&ScoreBreakdown> {
        self.breakdowns.iter().find(|b| &b.task_id == id)
    }

    /// Overview of the ranking.
    pub fn summary(&self, now: DateTime<FixedOffset>) -> PrioritySummary {
        let count = |tier: PriorityTier| {
            self.tasks
                .iter()
                .filter(|t| t.priority_tier == Some(tier))
                .count()
        };

        PrioritySummary {
            total: self.tasks.len(),
            high: count(PriorityTier::High),
            medium: count(PriorityTier::Medium),
            low: count(PriorityTier::Low),
            urgent: self
                .tasks
                .iter()
                .filter(|t| {
                    t.deadline
                        .is_some_and(|d| days_until(d, now) <= URGENT_WITHIN_DAYS)
                })
                .count(),
            top: self
                .tasks
                .iter()
                .take(3)
                .map(|t| RankedEntry {
                    task_id: t.id.clone(),
                    title: t.title.clone(),
                    score: t.score.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Counts per tier and the top of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritySummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Tasks due within a day (or overdue).
    pub urgent: usize,
    pub top: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub task_id: TaskId,
    pub title: String,
    pub score: f64,
}

/// Assigns scores and tiers and ranks tasks.
pub struct PriorityScorer<'a> {
    config: &'a DayplanConfig,
    now: DateTime<FixedOffset>,
}

impl<'a> PriorityScorer<'a> {
    /// Create a scorer; `now` anchors deadline proximity.
    pub fn new(config: &'a DayplanConfig, now: DateTime<FixedOffset>) -> Self {
        Self { config, now }
    }

    /// Score every task and return them in rank order.
    ///
    /// Tasks must come from the normalizer. Anything else (out-of-range
    /// ratings, empty titles, non-positive durations, already scored
    /// tasks) is a contract violation and aborts the batch.
    pub fn rank(&self, tasks: Vec<Task>) -> Result<RankedTasks, PipelineError> {
        let mut scored = Vec::with_capacity(tasks.len());

        for mut task in tasks {
            check_contract(&task)?;
            let breakdown = self.score(&task);
            let tier = self.config.tiers.tier_for(breakdown.total);
            task.assign_score(breakdown.total, tier);

            debug!(
                task_id = %task.id,
                score = breakdown.total,
                tier = %tier,
                "Scored task"
            );
            scored.push((task, breakdown));
        }

        // Stable: equal scores keep input order.
        scored.sort_by(|(_, a), (_, b)| b.total.total_cmp(&a.total));

        let (tasks, breakdowns) = scored.into_iter().unzip();
        Ok(RankedTasks { tasks, breakdowns })
    }

    /// Compute the score contributions for one task.
    pub fn score(&self, task: &Task) -> ScoreBreakdown {
        let weights = &self.config.weights;

        let urgency = weights.urgency * f64::from(task.urgency);
        let importance = weights.importance * self.config.importance_for(&task.category);
        let effort = weights.effort * f64::from(self.config.max_effort.saturating_sub(task.effort));
        let deadline = weights.deadline * deadline_proximity(task.deadline, self.now);
        let preference = if self.config.is_preferred(&task.category) {
            self.config.preference_bonus
        } else {
            0.0
        };

        ScoreBreakdown {
            task_id: task.id.clone(),
            urgency,
            importance,
            effort,
            deadline,
            preference,
            total: round2(urgency + importance + effort + deadline + preference),
        }
    }
}

/// Proximity factor in `0.0..=1.0`: 0 without a deadline, 1 when due now or
/// overdue, `1 / (1 + days_remaining)` otherwise.
pub fn deadline_proximity(deadline: Option<DateTime<FixedOffset>>, now: DateTime<FixedOffset>) -> f64 {
    match deadline {
        None => 0.0,
        Some(deadline) => 1.0 / (1.0 + days_until(deadline, now).max(0.0)),
    }
}

fn days_until(deadline: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> f64 {
    (deadline - now).num_seconds() as f64 / 86_400.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_contract(task: &Task) -> Result<(), PipelineError> {
    let violation = if task.is_scored() {
        Some("already scored")
    } else if task.title.trim().is_empty() {
        Some("empty title")
    } else if task.duration_minutes <= 0 {
        Some("non-positive duration")
    } else if !RATING_RANGE.contains(&task.urgency) {
        Some("urgency out of range")
    } else if !RATING_RANGE.contains(&task.effort) {
        Some("effort out of range")
    } else {
        None
    };

    match violation {
        Some(reason) => Err(PipelineError::InternalContract(format!(
            "scorer received un-normalized task {}: {}",
            task.id, reason
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00+02:00").unwrap()
    }

    fn task(position: usize, title: &str) -> Task {
        Task::new(TaskId::for_position(position), title, 30)
    }

    #[test]
    fn test_formula_with_defaults() {
        let config = DayplanConfig::default();
        let scorer = PriorityScorer::new(&config, now());

        let report = task(1, "Write report").with_urgency(5).with_category("work");
        let b = scorer.score(&report);
        assert!((b.urgency - 2.0).abs() < 1e-9);
        assert!((b.importance - 1.6).abs() < 1e-9);
        assert!((b.effort - 0.2).abs() < 1e-9);
        assert_eq!(b.deadline, 0.0);
        assert_eq!(b.total, 3.8);

        let walk = task(2, "Walk").with_urgency(2).with_category("personal");
        assert_eq!(scorer.score(&walk).total, 1.8);
    }

    #[test]
    fn test_lower_effort_scores_higher() {
        let config = DayplanConfig::default();
        let scorer = PriorityScorer::new(&config, now());
        let easy = scorer.score(&task(1, "Easy").with_effort(1));
        let hard = scorer.score(&task(2, "Hard").with_effort(5));
        assert!(easy.total > hard.total);
    }

    #[test]
    fn test_deadline_proximity_is_monotonic_and_capped() {
        let none = deadline_proximity(None, now());
        let week = deadline_proximity(Some(now() + Duration::days(7)), now());
        let day = deadline_proximity(Some(now() + Duration::days(1)), now());
        let due = deadline_proximity(Some(now()), now());
        let overdue = deadline_proximity(Some(now() - Duration::days(30)), now());

        assert_eq!(none, 0.0);
        assert!(week < day);
        assert!(day < due);
        assert!((day - 0.5).abs() < 1e-9);
        assert_eq!(due, 1.0);
        assert_eq!(overdue, 1.0);
    }

    #[test]
    fn test_rank_orders_by_descending_score() {
        let config = DayplanConfig::default();
        let ranked = PriorityScorer::new(&config, now())
            .rank(vec![
                task(1, "Low").with_urgency(1),
                task(2, "High").with_urgency(5).with_category("work"),
                task(3, "Mid"),
            ])
            .unwrap();

        let titles: Vec<&str> = ranked.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["High", "Mid", "Low"]);
        assert!(ranked.tasks.iter().all(Task::is_scored));
        assert_eq!(ranked.tasks[0].priority_tier, Some(PriorityTier::High));
        assert_eq!(ranked.tasks[1].priority_tier, Some(PriorityTier::Medium));
        assert_eq!(ranked.tasks[2].priority_tier, Some(PriorityTier::Low));
        assert_eq!(ranked.breakdowns[0].task_id, ranked.tasks[0].id);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let config = DayplanConfig::default();
        let ranked = PriorityScorer::new(&config, now())
            .rank(vec![
                task(1, "A"),
                task(2, "B").with_urgency(5),
                task(3, "C"),
                task(4, "D"),
            ])
            .unwrap();

        let ids: Vec<&str> = ranked.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["task-2", "task-1", "task-3", "task-4"]);
    }

    #[test]
    fn test_preferred_category_bonus() {
        let config = DayplanConfig {
            preferred_categories: vec!["Review".to_string()],
            ..Default::default()
        };
        let scorer = PriorityScorer::new(&config, now());
        let b = scorer.score(&task(1, "PRs").with_category("review"));
        assert_eq!(b.preference, 0.2);
    }

    #[test]
    fn test_contract_violations_abort() {
        let config = DayplanConfig::default();
        let scorer = PriorityScorer::new(&config, now());

        let err = scorer.rank(vec![task(1, "x").with_urgency(9)]).unwrap_err();
        assert!(matches!(err, PipelineError::InternalContract(_)));

        let mut scored = task(1, "x");
        scored.assign_score(1.0, PriorityTier::Low);
        let err = scorer.rank(vec![scored]).unwrap_err();
        assert!(err.to_string().contains("already scored"));
    }

    #[test]
    fn test_summary() {
        let config = DayplanConfig::default();
        let ranked = PriorityScorer::new(&config, now())
            .rank(vec![
                task(1, "Due soon").with_deadline(now() + Duration::hours(3)),
                task(2, "Work").with_urgency(5).with_category("work"),
                task(3, "Later").with_deadline(now() + Duration::days(5)),
                task(4, "Chill").with_urgency(1),
            ])
            .unwrap();
        let summary = ranked.summary(now());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.urgent, 1);
        assert_eq!(summary.top.len(), 3);
        assert_eq!(summary.top[0].title, "Work");
        assert_eq!(summary.high + summary.medium + summary.low, 4);
    }
}

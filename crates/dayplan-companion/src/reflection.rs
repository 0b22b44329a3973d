//! Reflection on a finished schedule.
//!
//! [`ReflectionGenerator`] is the seam for anything that turns a schedule
//! and its score breakdowns into prose. [`RuleBasedReflector`] is the
//! built-in, deterministic implementation.

use std::fmt::{self, Write as _};

use async_trait::async_trait;
use dayplan_core::{Schedule, ScoreBreakdown, SoftWarning};
use tracing::debug;

use crate::error::ReflectionError;
use crate::evaluation::{evaluate_plan, PlanEvaluation};

/// Produces a textual reflection for a schedule.
#[async_trait]
pub trait ReflectionGenerator: Send + Sync {
    /// Reflect on `schedule`; `scores` are the breakdowns of its tasks.
    async fn generate_reflection(
        &self,
        schedule: &Schedule,
        scores: &[ScoreBreakdown],
    ) -> Result<String, ReflectionError>;
}

/// Reflection built from [`evaluate_plan`] and the score breakdowns.
#[derive(Debug, Clone)]
pub struct RuleBasedReflector {
    max_work_hours: i64,
}

impl RuleBasedReflector {
    pub fn new(max_work_hours: i64) -> Self {
        Self { max_work_hours }
    }
}

impl Default for RuleBasedReflector {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl ReflectionGenerator for RuleBasedReflector {
    async fn generate_reflection(
        &self,
        schedule: &Schedule,
        scores: &[ScoreBreakdown],
    ) -> Result<String, ReflectionError> {
        if let Some(unknown) = scores.iter().find(|s| schedule.task(&s.task_id).is_none()) {
            return Err(ReflectionError::UnknownTask(unknown.task_id.to_string()));
        }

        let eval = evaluate_plan(schedule, self.max_work_hours);
        let mut out = String::new();
        write_reflection(&mut out, schedule, scores, &eval)
            .map_err(|e| ReflectionError::Generation(e.to_string()))?;

        debug!(grade = %eval.grade, total = eval.total, "Generated reflection");
        Ok(out)
    }
}

fn write_reflection(
    out: &mut String,
    schedule: &Schedule,
    scores: &[ScoreBreakdown],
    eval: &PlanEvaluation,
) -> fmt::Result {
    writeln!(out, "Plan grade: {} ({:.0}/100)", eval.grade, eval.total)?;
    writeln!(
        out,
        "Time efficiency {:.0}/25, priority alignment {:.0}/25, feasibility {:.0}/25, work-life balance {:.0}/25",
        eval.time_efficiency, eval.priority_alignment, eval.feasibility, eval.work_life_balance
    )?;

    if let Some((task, breakdown)) = scores
        .iter()
        .max_by(|a, b| a.total.total_cmp(&b.total))
        .and_then(|s| schedule.task(&s.task_id).map(|t| (t, s)))
    {
        writeln!(
            out,
            "Top priority: {} (score {:.2}), driven mostly by {}.",
            task.title,
            breakdown.total,
            main_driver(breakdown)
        )?;
    }

    for (task_id, warning) in schedule.warnings() {
        let title = schedule
            .task(task_id)
            .map(|t| t.title.as_str())
            .unwrap_or_else(|| task_id.as_str());
        match warning {
            SoftWarning::DeadlineExceeded {
                overrun_minutes, ..
            } => writeln!(
                out,
                "Deadline pressure: {} ends {} minutes after its deadline.",
                title, overrun_minutes
            )?,
        }
    }

    writeln!(out, "Feedback:")?;
    for line in &eval.feedback {
        writeln!(out, "- {}", line)?;
    }
    if !eval.recommendations.is_empty() {
        writeln!(out, "Recommendations:")?;
        for line in &eval.recommendations {
            writeln!(out, "- {}", line)?;
        }
    }
    Ok(())
}

fn main_driver(b: &ScoreBreakdown) -> &'static str {
    [
        ("urgency", b.urgency),
        ("category importance", b.importance),
        ("low effort", b.effort),
        ("deadline proximity", b.deadline),
        ("preference", b.preference),
    ]
    .into_iter()
    .fold(("urgency", f64::MIN), |best, cur| {
        if cur.1 > best.1 {
            cur
        } else {
            best
        }
    })
    .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use dayplan_core::{DayplanConfig, Pipeline, PlanContext, PlanOutcome, TaskId};

    fn outcome(raw: &str) -> PlanOutcome {
        let ctx = PlanContext::starting_at(
            DateTime::parse_from_rfc3339("2026-10-19T09:00:00+02:00").unwrap(),
        );
        Pipeline::new(DayplanConfig::default())
            .unwrap()
            .plan_text(raw, &ctx)
            .unwrap()
    }

    #[tokio::test]
    async fn test_reflection_mentions_grade_and_top_task() {
        let raw = r#"[
            {"title": "Write report", "duration": 90, "urgency": 5, "importance": "work"},
            {"title": "Walk", "duration": 30, "urgency": 2, "importance": "personal"}
        ]"#;
        let outcome = outcome(raw);
        let text = RuleBasedReflector::default()
            .generate_reflection(&outcome.schedule, &outcome.ranked.breakdowns)
            .await
            .unwrap();

        assert!(text.starts_with("Plan grade: "));
        assert!(text.contains("Top priority: Write report (score 3.80), driven mostly by urgency."));
        assert!(text.contains("Feedback:"));
    }

    #[tokio::test]
    async fn test_reflection_is_deterministic() {
        let outcome = outcome("a 30 min\nb 2h\nc (high, 45 min)");
        let reflector = RuleBasedReflector::default();
        let first = reflector
            .generate_reflection(&outcome.schedule, &outcome.ranked.breakdowns)
            .await
            .unwrap();
        let second = reflector
            .generate_reflection(&outcome.schedule, &outcome.ranked.breakdowns)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reflection_reports_deadline_pressure() {
        let outcome = outcome("File taxes 60 min due 2026-10-19T09:30:00+02:00");
        let text = RuleBasedReflector::default()
            .generate_reflection(&outcome.schedule, &outcome.ranked.breakdowns)
            .await
            .unwrap();
        assert!(
            text.contains("Deadline pressure: File taxes ends 30 minutes after its deadline."),
            "{text}"
        );
    }

    #[tokio::test]
    async fn test_unknown_score_is_error() {
        let outcome = outcome("a 30 min");
        let mut scores = outcome.ranked.breakdowns.clone();
        scores[0].task_id = TaskId::new("task-99");
        let err = RuleBasedReflector::default()
            .generate_reflection(&outcome.schedule, &scores)
            .await
            .unwrap_err();
        assert!(matches!(err, ReflectionError::UnknownTask(id) if id == "task-99"));
    }

    #[test]
    fn test_main_driver() {
        let b = ScoreBreakdown {
            task_id: TaskId::new("task-1"),
            urgency: 0.4,
            importance: 1.6,
            effort: 0.2,
            deadline: 0.5,
            preference: 0.0,
            total: 2.7,
        };
        assert_eq!(main_driver(&b), "category importance");
    }
}

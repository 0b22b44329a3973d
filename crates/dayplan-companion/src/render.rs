//! Plain-text schedule rendering.

use std::fmt;

use dayplan_core::{PlanOutcome, SoftWarning};

use crate::reminder::Reminder;

/// Render a plan as human-readable text.
pub fn render_schedule(outcome: &PlanOutcome, reminders: &[Reminder]) -> String {
    PlanText { outcome, reminders }.to_string()
}

struct PlanText<'a> {
    outcome: &'a PlanOutcome,
    reminders: &'a [Reminder],
}

impl fmt::Display for PlanText<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;
        let schedule = &outcome.schedule;

        writeln!(
            out,
            "Daily plan for {} (starts {})",
            outcome.day_start.format("%Y-%m-%d"),
            outcome.day_start.format("%H:%M")
        )?;
        writeln!(out)?;

        writeln!(out, "Overview")?;
        writeln!(out, "  Tasks:     {}", schedule.tasks.len())?;
        writeln!(out, "  Work time: {}", hours_minutes(schedule.total_task_minutes()))?;
        writeln!(out, "  Breaks:    {}", hours_minutes(schedule.total_break_minutes()))?;
        writeln!(out, "  Reminders: {}", self.reminders.len())?;
        if let Some(end) = schedule.ends_at() {
            writeln!(out, "  Ends at:   {}", end.format("%H:%M"))?;
        }
        writeln!(out)?;

        if schedule.is_empty() {
            writeln!(out, "No tasks scheduled.")?;
        } else {
            writeln!(out, "Schedule")?;
            for entry in &schedule.entries {
                let span = format!(
                    "{}-{}",
                    entry.start_time.format("%H:%M"),
                    entry.end_time.format("%H:%M")
                );

                let Some(task) = entry.task_id.as_ref().and_then(|id| schedule.task(id)) else {
                    writeln!(out, "  {}  break ({} min)", span, entry.minutes())?;
                    continue;
                };

                let tier = task
                    .priority_tier
                    .map(|t| format!("[{}]", t))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "  {}  {:<8} {} ({} min, {}) score {:.2}",
                    span,
                    tier,
                    task.title,
                    task.duration_minutes,
                    task.category,
                    task.score.unwrap_or_default()
                )?;

                for warning in &entry.warnings {
                    match warning {
                        SoftWarning::DeadlineExceeded {
                            deadline,
                            overrun_minutes,
                            ..
                        } => writeln!(
                            out,
                            "      ! ends {} min after deadline {}",
                            overrun_minutes,
                            deadline.format("%Y-%m-%d %H:%M")
                        )?,
                    }
                }
            }
        }

        if !outcome.rejected.is_empty() {
            writeln!(out)?;
            writeln!(out, "Rejected")?;
            for error in &outcome.rejected {
                writeln!(out, "  - {}", error)?;
            }
        }

        Ok(())
    }
}

fn hours_minutes(minutes: i64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {:02}m", h, m),
    }
}

//! Timeline placement.
//!
//! Lays ranked tasks end to end from the day start, inserting a break after
//! each task whose length depends on the task's duration band. The builder
//! never reorders: it trusts the scorer's ranking. A task that ends after
//! its deadline is still placed, with a [`SoftWarning`] on its entry.

use chrono::{DateTime, Duration, FixedOffset};
use tracing::{debug, info, warn};

use crate::{DayplanConfig, PipelineError, Schedule, ScheduleEntry, SoftWarning, Task, ValidationError};

/// Builds a single day's schedule from ranked tasks.
pub struct TimelineBuilder<'a> {
    config: &'a DayplanConfig,
}

impl<'a> TimelineBuilder<'a> {
    /// Create a new builder.
    pub fn new(config: &'a DayplanConfig) -> Self {
        Self { config }
    }

    /// Place `ranked` tasks sequentially starting at `day_start`.
    ///
    /// Each task is visited exactly once, in order. Tasks with a duration
    /// outside `1..=max_duration_minutes`, or that would run past the end of
    /// the representable timeline, are rejected and skipped; an unscored
    /// task aborts the run. Whether a break follows the final task is
    /// controlled by `trailing_break`.
    pub fn build(
        &self,
        ranked: Vec<Task>,
        day_start: DateTime<FixedOffset>,
    ) -> Result<Schedule, PipelineError> {
        let mut schedule = Schedule::default();
        let mut cursor = day_start;
        let mut pending_break: Option<i64> = None;

        for (index, mut task) in ranked.into_iter().enumerate() {
            if !task.is_scored() {
                return Err(PipelineError::InternalContract(format!(
                    "timeline builder received unscored task {}",
                    task.id
                )));
            }

            let problem = if task.duration_minutes <= 0 {
                Some(format!("must be positive, got {}", task.duration_minutes))
            } else if task.duration_minutes > self.config.max_duration_minutes {
                Some(format!(
                    "must be at most {} minutes, got {}",
                    self.config.max_duration_minutes, task.duration_minutes
                ))
            } else {
                None
            };

            let span = match problem {
                Some(message) => Err(message),
                None => slot(cursor, pending_break, &task)
                    .ok_or_else(|| "does not fit on the timeline".to_string()),
            };
            let (start, end) = match span {
                Ok(span) => span,
                Err(message) => {
                    warn!(task_id = %task.id, duration = task.duration_minutes, "Refusing to place task");
                    schedule.rejected.push(
                        ValidationError::new(index + 1, "duration_minutes", message)
                            .with_task_id(task.id.clone()),
                    );
                    continue;
                }
            };

            if pending_break.take().is_some() {
                schedule.entries.push(ScheduleEntry::rest(cursor, start));
            }

            let mut entry = ScheduleEntry::task(task.id.clone(), start, end);

            if let Some(deadline) = task.deadline.filter(|d| end > *d) {
                let overrun_minutes = (end - deadline).num_minutes();
                warn!(task_id = %task.id, overrun_minutes, "Task ends after its deadline");
                entry.warnings.push(SoftWarning::DeadlineExceeded {
                    deadline,
                    end_time: end,
                    overrun_minutes,
                });
            }

            debug!(
                task_id = %task.id,
                start = %start.format("%H:%M"),
                end = %end.format("%H:%M"),
                "Placed task"
            );

            pending_break = Some(self.config.break_minutes_for(task.duration_minutes));
            task.place(start, end);
            schedule.entries.push(entry);
            schedule.tasks.push(task);
            cursor = end;
        }

        if self.config.trailing_break {
            if let Some(end) = pending_break.and_then(|minutes| after(cursor, minutes)) {
                schedule.entries.push(ScheduleEntry::rest(cursor, end));
            }
        }

        info!(
            tasks = schedule.tasks.len(),
            entries = schedule.entries.len(),
            rejected = schedule.rejected.len(),
            "Built timeline"
        );
        Ok(schedule)
    }
}

fn after(start: DateTime<FixedOffset>, minutes: i64) -> Option<DateTime<FixedOffset>> {
    start.checked_add_signed(Duration::try_minutes(minutes)?)
}

/// Start and end of `task` once the pending break has run.
fn slot(
    cursor: DateTime<FixedOffset>,
    pending_break: Option<i64>,
    task: &Task,
) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let start = match pending_break {
        Some(minutes) => after(cursor, minutes)?,
        None => cursor,
    };
    let end = start.checked_add_signed(task.duration()?)?;
    Some((start, end))
}

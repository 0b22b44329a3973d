//! JSON-lines output: one record per line on stdout.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use dayplan_companion::{ProgressReview, Reminder};
use dayplan_core::{PlanOutcome, PrioritySummary, ScheduleEntry, SessionId, Task, ValidationError};
use serde::Serialize;

/// Whole-plan document for `--format json`.
#[derive(Debug, Serialize)]
pub struct PlanReport<'a> {
    pub session_id: &'a SessionId,
    pub summary: PrioritySummary,
    #[serde(flatten)]
    pub outcome: &'a PlanOutcome,
    pub reminders: &'a [Reminder],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection: Option<&'a str>,
}

/// A single output line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Record<'a> {
    Session {
        session_id: &'a SessionId,
        day_start: DateTime<FixedOffset>,
        reference_time: DateTime<FixedOffset>,
    },
    Task(&'a Task),
    Entry(&'a ScheduleEntry),
    Reminder(&'a Reminder),
    Rejected(&'a ValidationError),
    Review(&'a ProgressReview),
}

/// Records for a plan: session header, tasks, entries, reminders, rejections.
pub fn plan_records<'a>(
    session: &'a SessionId,
    outcome: &'a PlanOutcome,
    reminders: &'a [Reminder],
) -> Vec<Record<'a>> {
    let header = Record::Session {
        session_id: session,
        day_start: outcome.day_start,
        reference_time: outcome.reference_time,
    };

    std::iter::once(header)
        .chain(outcome.schedule.tasks.iter().map(Record::Task))
        .chain(outcome.schedule.entries.iter().map(Record::Entry))
        .chain(reminders.iter().map(Record::Reminder))
        .chain(outcome.rejected.iter().map(Record::Rejected))
        .collect()
}

/// Write each record as one JSON line.
pub fn write_json_lines<W: Write>(mut out: W, records: &[Record<'_>]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

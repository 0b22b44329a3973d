//! Reminder derivation and persistence.
//!
//! Reminders are computed from placed task entries only; breaks never get
//! one. Lead time is chosen per task:
//!
//! | Condition                     | Lead                           |
//! |-------------------------------|--------------------------------|
//! | category is a meeting category | `meeting_lead_minutes`         |
//! | priority tier is high         | `high_priority_lead_minutes`   |
//! | otherwise                     | at start                       |

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, FixedOffset};
use dayplan_core::{PlanOutcome, PriorityTier, ReminderLeads, Schedule, SessionId, TaskId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ReminderError;

/// A reminder for one scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub reminder_id: String,
    pub task_id: TaskId,
    pub title: String,

    /// When the reminder fires.
    pub remind_at: DateTime<FixedOffset>,

    /// When the task itself starts.
    pub task_start: DateTime<FixedOffset>,

    pub minutes_before: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_tier: Option<PriorityTier>,

    pub message: String,
}

/// Derive reminders for every task entry, in timeline order.
pub fn derive_reminders(schedule: &Schedule, leads: &ReminderLeads) -> Vec<Reminder> {
    let reminders: Vec<Reminder> = schedule
        .task_entries()
        .filter_map(|entry| {
            let task = schedule.task(entry.task_id.as_ref()?)?;

            let minutes_before = if leads
                .meeting_categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&task.category))
            {
                leads.meeting_lead_minutes
            } else if task.priority_tier == Some(PriorityTier::High) {
                leads.high_priority_lead_minutes
            } else {
                0
            };

            let start = entry.start_time.format("%H:%M");
            let message = if minutes_before > 0 {
                format!(
                    "Reminder: {} starts in {} minutes at {}",
                    task.title, minutes_before, start
                )
            } else {
                format!("Time to start: {} (scheduled for {})", task.title, start)
            };

            let remind_at = entry
                .start_time
                .checked_sub_signed(Duration::try_minutes(minutes_before)?)?;

            Some(Reminder {
                reminder_id: format!("reminder-{}", task.id),
                task_id: task.id.clone(),
                title: task.title.clone(),
                remind_at,
                task_start: entry.start_time,
                minutes_before,
                priority_tier: task.priority_tier,
                message,
            })
        })
        .collect();

    debug!(count = reminders.len(), "Derived reminders");
    reminders
}

/// Paths written by [`ReminderStore::persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFiles {
    pub schedule: PathBuf,
    pub reminders: PathBuf,
    pub summary: PathBuf,
}

#[derive(Serialize)]
struct ReminderFile<'a> {
    session_id: &'a SessionId,
    reminders: &'a [Reminder],
}

/// Writes a session's plan, reminders and rendered summary to a directory.
#[derive(Debug, Clone)]
pub struct ReminderStore {
    dir: PathBuf,
}

impl ReminderStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `schedule_<session>.json`, `reminders_<session>.json` and
    /// `summary_<session>.txt`.
    pub async fn persist(
        &self,
        session: &SessionId,
        outcome: &PlanOutcome,
        reminders: &[Reminder],
        summary: &str,
    ) -> Result<PersistedFiles, ReminderError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let files = PersistedFiles {
            schedule: self.dir.join(format!("schedule_{session}.json")),
            reminders: self.dir.join(format!("reminders_{session}.json")),
            summary: self.dir.join(format!("summary_{session}.txt")),
        };

        let schedule_json = serde_json::to_vec_pretty(outcome)?;
        tokio::fs::write(&files.schedule, schedule_json).await?;

        let reminder_json = serde_json::to_vec_pretty(&ReminderFile {
            session_id: session,
            reminders,
        })?;
        tokio::fs::write(&files.reminders, reminder_json).await?;

        tokio::fs::write(&files.summary, summary).await?;

        info!(
            session_id = %session,
            dir = %self.dir.display(),
            reminders = reminders.len(),
            "Persisted plan"
        );
        Ok(files)
    }

    /// Load a previously persisted plan.
    pub async fn load_plan(path: impl AsRef<Path>) -> Result<PlanOutcome, ReminderError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayplan_core::{DayplanConfig, Pipeline, PlanContext};

    fn outcome(raw: &str) -> PlanOutcome {
        let ctx = PlanContext::starting_at(
            DateTime::parse_from_rfc3339("2026-10-19T09:00:00+02:00").unwrap(),
        );
        Pipeline::new(DayplanConfig::default())
            .unwrap()
            .plan_text(raw, &ctx)
            .unwrap()
    }

    #[test]
    fn test_lead_times() {
        let raw = r#"[
            {"title": "Standup", "category": "meeting", "duration": 15, "urgency": 3},
            {"title": "Ship fix", "category": "work", "duration": 60, "urgency": 5},
            {"title": "Stretch", "category": "health", "duration": 10, "urgency": 1}
        ]"#;
        let outcome = outcome(raw);
        let reminders = derive_reminders(&outcome.schedule, &DayplanConfig::default().reminders);

        assert_eq!(reminders.len(), 3);
        let by_title = |title: &str| reminders.iter().find(|r| r.title == title).unwrap();

        assert_eq!(by_title("Standup").minutes_before, 15);
        assert_eq!(by_title("Ship fix").minutes_before, 5);
        assert_eq!(by_title("Ship fix").priority_tier, Some(PriorityTier::High));
        assert_eq!(by_title("Stretch").minutes_before, 0);

        for r in &reminders {
            assert_eq!(r.task_start - r.remind_at, Duration::minutes(r.minutes_before));
        }
    }

    #[test]
    fn test_first_reminder_fires_before_day_start() {
        let outcome = outcome("Urgent call (high, 30 min)");
        let reminders = derive_reminders(&outcome.schedule, &DayplanConfig::default().reminders);
        assert_eq!(reminders[0].remind_at.format("%H:%M").to_string(), "08:55");
        assert_eq!(reminders[0].reminder_id, "reminder-task-1");
        assert!(reminders[0].message.contains("starts in 5 minutes at 09:00"));
    }

    #[test]
    fn test_no_reminders_for_breaks() {
        let outcome = outcome("a 30 min\nb 30 min\nc 30 min");
        let reminders = derive_reminders(&outcome.schedule, &DayplanConfig::default().reminders);
        assert_eq!(outcome.schedule.break_entries().count(), 2);
        assert_eq!(reminders.len(), 3);
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReminderStore::new(dir.path().join("out"));
        let outcome = outcome("Write report 90 min\nWalk 30 min");
        let reminders = derive_reminders(&outcome.schedule, &DayplanConfig::default().reminders);
        let session = SessionId::new("abc");

        let files = store
            .persist(&session, &outcome, &reminders, "summary text")
            .await
            .unwrap();

        assert!(files.schedule.ends_with("schedule_abc.json"));
        assert!(files.reminders.ends_with("reminders_abc.json"));
        assert_eq!(
            tokio::fs::read_to_string(&files.summary).await.unwrap(),
            "summary text"
        );

        let stored: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&files.reminders).await.unwrap())
                .unwrap();
        assert_eq!(stored["session_id"], "abc");
        assert_eq!(stored["reminders"].as_array().unwrap().len(), 2);

        let loaded = ReminderStore::load_plan(&files.schedule).await.unwrap();
        assert_eq!(loaded.schedule.entries, outcome.schedule.entries);
        assert_eq!(loaded.day_start, outcome.day_start);
    }

    #[tokio::test]
    async fn test_load_missing_plan_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReminderStore::load_plan(dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::Io(_)));
    }
}

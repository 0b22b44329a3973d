//! Schedule types produced by the timeline builder.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{EntryKind, Task, TaskId, ValidationError};

/// Non-fatal advisory attached to a schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoftWarning {
    /// The task's slot ends after its deadline.
    DeadlineExceeded {
        deadline: DateTime<FixedOffset>,
        end_time: DateTime<FixedOffset>,
        overrun_minutes: i64,
    },
}

/// One placed task or break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Placed task, `None` for a break.
    pub task_id: Option<TaskId>,

    pub kind: EntryKind,

    pub start_time: DateTime<FixedOffset>,

    pub end_time: DateTime<FixedOffset>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SoftWarning>,
}

impl ScheduleEntry {
    /// Create a task entry.
    pub fn task(
        task_id: TaskId,
        start_time: DateTime<FixedOffset>,
        end_time: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            task_id: Some(task_id),
            kind: EntryKind::Task,
            start_time,
            end_time,
            warnings: Vec::new(),
        }
    }

    /// Create a break entry.
    pub fn rest(start_time: DateTime<FixedOffset>, end_time: DateTime<FixedOffset>) -> Self {
        Self {
            task_id: None,
            kind: EntryKind::Break,
            start_time,
            end_time,
            warnings: Vec::new(),
        }
    }

    /// Length of the entry in whole minutes.
    pub fn minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn is_break(&self) -> bool {
        self.kind.is_break()
    }
}

/// A single day's timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Entries ordered by start time, without gaps or overlaps.
    pub entries: Vec<ScheduleEntry>,

    /// Placed tasks with start and end times filled in, in placement order.
    pub tasks: Vec<Task>,

    /// Tasks the builder refused to place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<ValidationError>,
}

impl Schedule {
    /// Whether the schedule has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Task entries in placement order.
    pub fn task_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| !e.is_break())
    }

    /// Break entries in placement order.
    pub fn break_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| e.is_break())
    }

    /// Placed task by id.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Total minutes spent on tasks.
    pub fn total_task_minutes(&self) -> i64 {
        self.task_entries().map(ScheduleEntry::minutes).sum()
    }

    /// Total minutes spent on breaks.
    pub fn total_break_minutes(&self) -> i64 {
        self.break_entries().map(ScheduleEntry::minutes).sum()
    }

    /// Start of the first entry.
    pub fn starts_at(&self) -> Option<DateTime<FixedOffset>> {
        self.entries.first().map(|e| e.start_time)
    }

    /// End of the last entry.
    pub fn ends_at(&self) -> Option<DateTime<FixedOffset>> {
        self.entries.last().map(|e| e.end_time)
    }

    /// All warnings with the task they belong to.
    pub fn warnings(&self) -> impl Iterator<Item = (&TaskId, &SoftWarning)> {
        self.entries.iter().flat_map(|e| {
            e.task_id
                .iter()
                .flat_map(move |id| e.warnings.iter().map(move |w| (id, w)))
        })
    }

    /// Every entry has positive length and touches its successor.
    pub fn is_contiguous(&self) -> bool {
        self.entries.iter().all(|e| e.start_time < e.end_time)
            && self
                .entries
                .windows(2)
                .all(|pair| pair[0].end_time == pair[1].start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("2026-10-19T{:02}:{:02}:00+02:00", hour, minute))
            .unwrap()
    }

    #[test]
    fn test_totals_and_contiguity() {
        let schedule = Schedule {
            entries: vec![
                ScheduleEntry::task(TaskId::for_position(1), at(9, 0), at(10, 30)),
                ScheduleEntry::rest(at(10, 30), at(10, 45)),
                ScheduleEntry::task(TaskId::for_position(2), at(10, 45), at(11, 15)),
            ],
            tasks: Vec::new(),
            rejected: Vec::new(),
        };

        assert!(schedule.is_contiguous());
        assert_eq!(schedule.total_task_minutes(), 120);
        assert_eq!(schedule.total_break_minutes(), 15);
        assert_eq!(schedule.starts_at(), Some(at(9, 0)));
        assert_eq!(schedule.ends_at(), Some(at(11, 15)));
    }

    #[test]
    fn test_gap_is_not_contiguous() {
        let schedule = Schedule {
            entries: vec![
                ScheduleEntry::task(TaskId::for_position(1), at(9, 0), at(9, 30)),
                ScheduleEntry::task(TaskId::for_position(2), at(9, 31), at(10, 0)),
            ],
            ..Default::default()
        };
        assert!(!schedule.is_contiguous());
    }

    #[test]
    fn test_warnings_carry_task_id() {
        let mut entry = ScheduleEntry::task(TaskId::for_position(4), at(9, 0), at(11, 0));
        entry.warnings.push(SoftWarning::DeadlineExceeded {
            deadline: at(10, 0),
            end_time: at(11, 0),
            overrun_minutes: (at(11, 0) - at(10, 0)).num_minutes(),
        });
        let schedule = Schedule {
            entries: vec![entry, ScheduleEntry::rest(at(11, 0), at(11, 0) + Duration::minutes(20))],
            ..Default::default()
        };

        let warnings: Vec<_> = schedule.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].0, &TaskId::for_position(4));
    }
}

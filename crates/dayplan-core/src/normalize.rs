//! Task normalization.
//!
//! Turns [`RawTask`] input into uniform [`Task`] values. Defaults come from
//! [`DayplanConfig`]; structural problems are reported as
//! [`ValidationError`]s naming the offending field. Text heuristics
//! (durations, deadlines, tags) are best effort and never fail a task.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::config::{DEFAULT_CATEGORY, DEFAULT_RATING, RATING_RANGE};
use crate::dates::parse_deadline;
use crate::{DayplanConfig, PriorityTier, RawTask, Task, TaskId, TaskRecord, ValidationError};

/// Result of normalizing one batch.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Tasks that passed validation, in input order.
    pub tasks: Vec<Task>,
    /// One error per rejected record.
    pub rejected: Vec<ValidationError>,
}

/// Normalizes raw input against a configuration.
pub struct TaskNormalizer<'a> {
    config: &'a DayplanConfig,
    now: DateTime<FixedOffset>,
}

impl<'a> TaskNormalizer<'a> {
    /// Create a normalizer; `now` anchors relative deadlines.
    pub fn new(config: &'a DayplanConfig, now: DateTime<FixedOffset>) -> Self {
        Self { config, now }
    }

    /// Normalize a whole batch, collecting errors per record.
    pub fn normalize_batch(&self, batch: &[RawTask]) -> NormalizedBatch {
        let mut out = NormalizedBatch::default();

        for (index, raw) in batch.iter().enumerate() {
            match self.normalize(index + 1, raw) {
                Ok(task) => out.tasks.push(task),
                Err(e) => {
                    warn!(position = e.position, field = %e.field, error = %e.message, "Rejected task");
                    out.rejected.push(e);
                }
            }
        }

        debug!(
            accepted = out.tasks.len(),
            rejected = out.rejected.len(),
            "Normalized batch"
        );
        out
    }

    /// Normalize the record at 1-based `position`.
    pub fn normalize(&self, position: usize, raw: &RawTask) -> Result<Task, ValidationError> {
        let id = TaskId::for_position(position);
        let result = match raw {
            RawTask::Text(text) => self.from_text(&id, text),
            RawTask::Record(record) => self.from_record(&id, record),
            RawTask::Malformed { field, reason } => {
                Err(ValidationError::new(0, field.as_str(), reason.clone()))
            }
        };

        result.map_err(|mut e| {
            e.position = position;
            e.with_task_id(id)
        })
    }

    fn from_record(&self, id: &TaskId, record: &TaskRecord) -> Result<Task, ValidationError> {
        let title = record.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(ValidationError::new(0, "title", "title must not be empty"));
        }

        let duration_minutes = match record.duration_minutes {
            Some(minutes) => self.checked_duration(minutes)?,
            None => self.config.default_duration_minutes,
        };

        let urgency = match (record.urgency, record.priority.as_deref()) {
            (Some(value), _) => rating("urgency", value)?,
            (None, Some(label)) => PriorityTier::from_label(label)
                .map(|tier| tier.implied_urgency())
                .ok_or_else(|| {
                    ValidationError::new(
                        0,
                        "priority",
                        format!("expected high, medium or low, got '{}'", label),
                    )
                })?,
            (None, None) => DEFAULT_RATING,
        };

        let effort = record
            .effort
            .map(|value| rating("effort", value))
            .transpose()?
            .unwrap_or(DEFAULT_RATING);

        let deadline = match record.deadline.as_deref().map(str::trim) {
            Some(phrase) if !phrase.is_empty() => {
                Some(parse_deadline(phrase, self.now).ok_or_else(|| {
                    ValidationError::new(0, "deadline", format!("unrecognized date '{}'", phrase))
                })?)
            }
            _ => None,
        };

        let mut task = Task::new(id.clone(), title, duration_minutes);
        task.category = category(record.category.as_deref());
        task.urgency = urgency;
        task.effort = effort;
        task.deadline = deadline;
        task.tags = record
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        task.description = record.description.clone().unwrap_or_default();

        debug!(task_id = %task.id, title = %task.title, duration = task.duration_minutes, "Normalized record");
        Ok(task)
    }

    fn from_text(&self, id: &TaskId, text: &str) -> Result<Task, ValidationError> {
        let mut rest = text.trim().to_string();
        let mut urgency = DEFAULT_RATING;
        let mut duration = None;

        // "Task name (high, 60 min)"
        if let Some(caps) = annotation_re().captures(&rest) {
            urgency = PriorityTier::from_label(&caps["priority"])
                .map(|tier| tier.implied_urgency())
                .unwrap_or(DEFAULT_RATING);
            duration = caps["duration"].parse::<i64>().ok().filter(|m| *m > 0);
            rest = caps["title"].to_string();
        }

        let deadline = self.take_deadline(&mut rest);

        if duration.is_none() {
            duration = take_duration(&mut rest);
        }

        let tags: BTreeSet<String> = tag_re()
            .captures_iter(&rest)
            .map(|caps| caps[1].to_string())
            .collect();
        let rest = tag_re().replace_all(&rest, "");

        let title = clean_title(&rest);
        if title.is_empty() {
            return Err(ValidationError::new(0, "title", "title must not be empty"));
        }

        let duration_minutes = match duration {
            Some(minutes) => self.checked_duration(minutes)?,
            None => self.config.default_duration_minutes,
        };

        let mut task = Task::new(id.clone(), title, duration_minutes);
        task.urgency = urgency;
        task.deadline = deadline;
        task.tags = tags;

        debug!(task_id = %task.id, title = %task.title, duration = task.duration_minutes, "Normalized text");
        Ok(task)
    }

    /// Durations must be positive and at most `max_duration_minutes`.
    fn checked_duration(&self, minutes: i64) -> Result<i64, ValidationError> {
        if minutes <= 0 {
            return Err(ValidationError::new(
                0,
                "duration_minutes",
                format!("must be positive, got {}", minutes),
            ));
        }
        if minutes > self.config.max_duration_minutes {
            return Err(ValidationError::new(
                0,
                "duration_minutes",
                format!(
                    "must be at most {} minutes, got {}",
                    self.config.max_duration_minutes, minutes
                ),
            ));
        }
        Ok(minutes)
    }

    /// Strip a trailing `due <date>` / `by <date>` phrase that parses.
    fn take_deadline(&self, text: &mut String) -> Option<DateTime<FixedOffset>> {
        let (start, deadline) = deadline_re().find_iter(text).find_map(|m| {
            parse_deadline(&text[m.end()..], self.now).map(|deadline| (m.start(), deadline))
        })?;
        text.truncate(start);
        Some(deadline)
    }
}

fn rating(field: &str, value: i64) -> Result<u8, ValidationError> {
    u8::try_from(value)
        .ok()
        .filter(|v| RATING_RANGE.contains(v))
        .ok_or_else(|| {
            ValidationError::new(
                0,
                field,
                format!(
                    "must be within {}..={}, got {}",
                    RATING_RANGE.start(),
                    RATING_RANGE.end(),
                    value
                ),
            )
        })
}

fn category(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Extract the first duration phrase, removing it from `text`.
///
/// Returns `None` when nothing usable is found.
fn take_duration(text: &mut String) -> Option<i64> {
    let (range, minutes) = [
        (combined_duration_re(), combined_minutes as fn(&Captures) -> Option<i64>),
        (hours_re(), hour_minutes),
        (minutes_re(), plain_minutes),
    ]
    .into_iter()
    .find_map(|(re, convert)| {
        let caps = re.captures(text)?;
        let whole = caps.get(0)?;
        Some((whole.range(), convert(&caps)))
    })?;

    text.replace_range(range, " ");
    minutes.filter(|m| *m > 0)
}

fn combined_minutes(caps: &Captures) -> Option<i64> {
    let hours: i64 = caps[1].parse().ok()?;
    let minutes: i64 = caps[2].parse().ok()?;
    hours.checked_mul(60)?.checked_add(minutes)
}

fn hour_minutes(caps: &Captures) -> Option<i64> {
    let hours: f64 = caps[1].parse().ok()?;
    let minutes = (hours * 60.0).round();
    // Casting saturates; values outside i64 are treated as unreadable.
    (minutes.is_finite() && minutes.abs() < i64::MAX as f64).then_some(minutes as i64)
}

fn plain_minutes(caps: &Captures) -> Option<i64> {
    caps[1].parse().ok()
}

fn clean_title(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ',' || c == ':' || c.is_whitespace())
        .to_string()
}

fn annotation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?P<title>.+?)\s*\(\s*(?P<priority>high|medium|low)\s*,\s*(?P<duration>\d+)\s*min\w*\s*\)\s*$",
        )
        .expect("valid annotation regex")
    })
}

fn deadline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s(?:due|by)\s+").expect("valid deadline regex"))
}

fn combined_duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+)\s*(?:h|hrs?|hours?)\s*(\d+)\s*(?:m|mins?|minutes?)\b")
            .expect("valid duration regex")
    })
}

fn hours_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:h|hrs?|hours?)\b").expect("valid duration regex")
    })
}

fn minutes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+)\s*(?:m|mins?|minutes?)\b").expect("valid duration regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w[\w-]*)").expect("valid tag regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00+02:00").unwrap()
    }

    fn text(input: &str) -> Result<Task, ValidationError> {
        let config = DayplanConfig::default();
        TaskNormalizer::new(&config, now()).normalize(1, &RawTask::from(input))
    }

    fn record(record: TaskRecord) -> Result<Task, ValidationError> {
        let config = DayplanConfig::default();
        TaskNormalizer::new(&config, now()).normalize(1, &RawTask::Record(record))
    }

    #[test]
    fn test_record_defaults() {
        let task = record(TaskRecord::titled("Read paper")).unwrap();
        assert_eq!(task.id, TaskId::new("task-1"));
        assert_eq!(task.duration_minutes, 30);
        assert_eq!(task.category, "general");
        assert_eq!(task.urgency, 3);
        assert_eq!(task.effort, 3);
        assert!(task.deadline.is_none());
        assert!(!task.is_scored());
    }

    #[test]
    fn test_record_fields() {
        let task = record(
            TaskRecord::titled("  Write report ")
                .with_duration(90)
                .with_urgency(5)
                .with_effort(2)
                .with_category("Work")
                .with_deadline("tomorrow"),
        )
        .unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.duration_minutes, 90);
        assert_eq!(task.category, "work");
        assert_eq!(task.urgency, 5);
        assert_eq!(task.effort, 2);
        assert_eq!(
            task.deadline.unwrap().to_rfc3339(),
            "2026-10-20T23:59:59+02:00"
        );
    }

    #[test]
    fn test_priority_label_implies_urgency() {
        let mut raw = TaskRecord::titled("Ship it");
        raw.priority = Some("high".into());
        assert_eq!(record(raw).unwrap().urgency, 5);

        let mut raw = TaskRecord::titled("Ship it");
        raw.priority = Some("whenever".into());
        assert_eq!(record(raw).unwrap_err().field, "priority");
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = record(TaskRecord::titled("   ")).unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.position, 1);
        assert_eq!(err.task_id, Some(TaskId::new("task-1")));

        let err = record(TaskRecord::default()).unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let err = record(TaskRecord::titled("Broken").with_duration(-5)).unwrap_err();
        assert_eq!(err.field, "duration_minutes");
        let err = record(TaskRecord::titled("Broken").with_duration(0)).unwrap_err();
        assert_eq!(err.field, "duration_minutes");
    }

    #[test]
    fn test_out_of_range_ratings_rejected() {
        assert_eq!(
            record(TaskRecord::titled("x").with_urgency(7)).unwrap_err().field,
            "urgency"
        );
        assert_eq!(
            record(TaskRecord::titled("x").with_effort(0)).unwrap_err().field,
            "effort"
        );
        assert_eq!(
            record(TaskRecord::titled("x").with_urgency(-1)).unwrap_err().field,
            "urgency"
        );
    }

    #[test]
    fn test_unparseable_record_deadline_rejected() {
        let err = record(TaskRecord::titled("x").with_deadline("someday")).unwrap_err();
        assert_eq!(err.field, "deadline");
    }

    #[test]
    fn test_malformed_record() {
        let config = DayplanConfig::default();
        let err = TaskNormalizer::new(&config, now())
            .normalize(
                4,
                &RawTask::Malformed {
                    field: "duration_minutes".into(),
                    reason: "expected a number, got a string".into(),
                },
            )
            .unwrap_err();
        assert_eq!(err.field, "duration_minutes");
        assert_eq!(err.position, 4);
        assert_eq!(err.task_id, Some(TaskId::new("task-4")));
    }

    #[test]
    fn test_duration_above_maximum_rejected() {
        let err = record(TaskRecord::titled("Big").with_duration(1_000_000_000_000)).unwrap_err();
        assert_eq!(err.field, "duration_minutes");
        assert!(err.message.contains("at most 1440"));

        assert_eq!(record(TaskRecord::titled("Day").with_duration(1440)).unwrap().duration_minutes, 1440);

        let err = text("Sleep 99999999999999 hours").unwrap_err();
        assert_eq!(err.field, "duration_minutes");
        let err = text("Marathon 30 hours").unwrap_err();
        assert_eq!(err.field, "duration_minutes");
    }

    #[test]
    fn test_unrepresentable_text_duration_falls_back() {
        // Too large for i64 minutes: the phrase is dropped, the default applies.
        let task = text("Sleep 99999999999999999999 min").unwrap();
        assert_eq!(task.duration_minutes, 30);
        let task = text("Wait 9223372036854775807h 5m").unwrap();
        assert_eq!(task.duration_minutes, 30);
        assert_eq!(task.title, "Wait");
    }

    #[test]
    fn test_text_duration_phrases() {
        let cases = [
            ("Write report 2 hours", "Write report", 120),
            ("Standup 15 min", "Standup", 15),
            ("Deep work 1.5h", "Deep work", 90),
            ("Refactor 1h30m", "Refactor", 90),
            ("Review PRs for 45 minutes today", "Review PRs for today", 45),
            ("Quick call", "Quick call", 30),
        ];
        for (input, title, minutes) in cases {
            let task = text(input).unwrap();
            assert_eq!(task.title, title, "title for {input:?}");
            assert_eq!(task.duration_minutes, minutes, "duration for {input:?}");
        }
    }

    #[test]
    fn test_zero_duration_phrase_falls_back_to_default() {
        let task = text("Nap 0 min").unwrap();
        assert_eq!(task.duration_minutes, 30);
        assert_eq!(task.title, "Nap");
    }

    #[test]
    fn test_text_annotation() {
        let task = text("Prepare slides (HIGH, 60 min)").unwrap();
        assert_eq!(task.title, "Prepare slides");
        assert_eq!(task.urgency, 5);
        assert_eq!(task.duration_minutes, 60);
    }

    #[test]
    fn test_text_deadline_and_tags() {
        let task = text("Go by bus to the bank #errand due tomorrow").unwrap();
        assert_eq!(task.title, "Go by bus to the bank");
        assert!(task.tags.contains("errand"));
        assert_eq!(
            task.deadline.unwrap().to_rfc3339(),
            "2026-10-20T23:59:59+02:00"
        );
    }

    #[test]
    fn test_text_with_only_duration_rejected() {
        let err = text("2 hours").unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn test_batch_collects_errors_and_keeps_positions() {
        let config = DayplanConfig::default();
        let batch = vec![
            RawTask::from("First"),
            RawTask::Record(TaskRecord::titled("Second").with_duration(-5)),
            RawTask::from("Third"),
        ];
        let out = TaskNormalizer::new(&config, now()).normalize_batch(&batch);

        let ids: Vec<&str> = out.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["task-1", "task-3"]);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].position, 2);
        assert_eq!(out.rejected[0].field, "duration_minutes");
    }
}

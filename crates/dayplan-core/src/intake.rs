//! Raw task input and batch parsing.
//!
//! A batch arrives either as JSON (`{"tasks": [...]}`, an array, or a single
//! record) or as plain text with one task per line.
//!
//! JSON records are read field by field. Several fields accept more than
//! one spelling; the first spelling present (and not `null`) wins:
//!
//! | field              | spellings, in order                                              |
//! |--------------------|------------------------------------------------------------------|
//! | `title`            | `title`, `name`                                                  |
//! | `category`         | `category`, then `importance` when it is a string                |
//! | `duration_minutes` | `duration_minutes`, `estimated_duration`, `estimated_time`, `duration` |
//! | `deadline`         | `deadline`, `due_date`                                           |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::IntakeError;

const TITLE_KEYS: &[&str] = &["title", "name"];
const DURATION_KEYS: &[&str] = &[
    "duration_minutes",
    "estimated_duration",
    "estimated_time",
    "duration",
];
const DEADLINE_KEYS: &[&str] = &["deadline", "due_date"];

/// One task as supplied by the caller, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTask {
    /// Free text, e.g. `Write report 2 hours`.
    Text(String),

    /// Partially structured record.
    Record(TaskRecord),

    /// Structured input that could not be read as a record.
    Malformed { field: String, reason: String },
}

impl From<&str> for RawTask {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<TaskRecord> for RawTask {
    fn from(record: TaskRecord) -> Self {
        Self::Record(record)
    }
}

/// Structured task record; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRecord {
    pub title: Option<String>,

    pub category: Option<String>,

    pub duration_minutes: Option<i64>,

    pub deadline: Option<String>,

    pub urgency: Option<i64>,

    /// `high`, `medium` or `low`; implies an urgency when `urgency` is absent.
    pub priority: Option<String>,

    pub effort: Option<i64>,

    pub tags: Vec<String>,

    pub description: Option<String>,
}

/// A record field with the wrong JSON type.
#[derive(Debug, Clone, PartialEq)]
struct FieldError {
    field: &'static str,
    reason: String,
}

impl FieldError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl TaskRecord {
    /// Record with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Builder method to set the duration.
    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Builder method to set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder method to set urgency.
    pub fn with_urgency(mut self, urgency: i64) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Builder method to set effort.
    pub fn with_effort(mut self, effort: i64) -> Self {
        self.effort = Some(effort);
        self
    }

    /// Builder method to set the deadline phrase.
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Read a JSON object. Unknown keys are ignored.
    fn from_object(map: &Map<String, Value>) -> Result<Self, FieldError> {
        let category = match string_field(map, "category", &["category"])? {
            Some(category) => Some(category),
            // A numeric importance is a weight, not a category name.
            None => match first_present(map, &["importance"]) {
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            },
        };

        Ok(Self {
            title: string_field(map, "title", TITLE_KEYS)?,
            category,
            duration_minutes: integer_field(map, "duration_minutes", DURATION_KEYS)?,
            deadline: string_field(map, "deadline", DEADLINE_KEYS)?,
            urgency: integer_field(map, "urgency", &["urgency"])?,
            priority: string_field(map, "priority", &["priority"])?,
            effort: integer_field(map, "effort", &["effort"])?,
            tags: tags_field(map)?,
            description: string_field(map, "description", &["description"])?,
        })
    }
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

fn string_field(
    map: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
) -> Result<Option<String>, FieldError> {
    match first_present(map, keys) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(FieldError::new(
            field,
            format!("expected a string, got {}", json_kind(other)),
        )),
    }
}

fn integer_field(
    map: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
) -> Result<Option<i64>, FieldError> {
    match first_present(map, keys) {
        None => Ok(None),
        Some(Value::Number(n)) => whole_number(n).map(Some).ok_or_else(|| {
            FieldError::new(field, format!("expected a whole number, got {}", n))
        }),
        Some(other) => Err(FieldError::new(
            field,
            format!("expected a number, got {}", json_kind(other)),
        )),
    }
}

/// `45` and `45.0` are both 45; fractions and out-of-range values are not
/// whole numbers.
fn whole_number(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn tags_field(map: &Map<String, Value>) -> Result<Vec<String>, FieldError> {
    match first_present(map, &["tags"]) {
        None => Ok(Vec::new()),
        Some(Value::String(tag)) => Ok(vec![tag.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(tag) => Ok(tag.clone()),
                other => Err(FieldError::new(
                    "tags",
                    format!("expected strings, got {}", json_kind(other)),
                )),
            })
            .collect(),
        Some(other) => Err(FieldError::new(
            "tags",
            format!("expected an array of strings, got {}", json_kind(other)),
        )),
    }
}

/// Split raw caller input into a batch of raw tasks.
pub fn parse_batch(raw: &str) -> Result<Vec<RawTask>, IntakeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            let batch = from_json(value)?;
            debug!(count = batch.len(), "Parsed JSON batch");
            return Ok(batch);
        }
    }

    let batch: Vec<RawTask> = trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(RawTask::from)
        .collect();
    debug!(count = batch.len(), "Parsed text batch");
    Ok(batch)
}

fn from_json(value: Value) -> Result<Vec<RawTask>, IntakeError> {
    match value {
        Value::Object(mut map) if map.contains_key("tasks") => match map.remove("tasks") {
            Some(Value::Array(items)) => Ok(items.into_iter().map(from_item).collect()),
            Some(other) => Err(IntakeError::UnsupportedShape(format!(
                "`tasks` must be an array, got {}",
                json_kind(&other)
            ))),
            None => Ok(Vec::new()),
        },
        Value::Array(items) => Ok(items.into_iter().map(from_item).collect()),
        object @ Value::Object(_) => Ok(vec![from_item(object)]),
        other => Err(IntakeError::UnsupportedShape(json_kind(&other).to_string())),
    }
}

fn from_item(item: Value) -> RawTask {
    match item {
        Value::String(text) => RawTask::Text(text),
        Value::Object(map) => match TaskRecord::from_object(&map) {
            Ok(record) => RawTask::Record(record),
            Err(e) => RawTask::Malformed {
                field: e.field.to_string(),
                reason: e.reason,
            },
        },
        other => RawTask::Malformed {
            field: "record".to_string(),
            reason: format!("expected an object or a string, got {}", json_kind(&other)),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

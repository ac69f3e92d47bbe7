// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;
use uuid::Uuid;

/// Format accepted for `due_date` filters.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

// ISO 8601 without an offset, as older task files store `created_at`.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[allow(clippy::doc_overindented_list_items)]
/// Represents a task within the system.
///
/// Derivation attributes (derive):
/// - `Serialize`, `Deserialize`: Allows conversion to/from the JSON store and the API.
/// - `Debug`: Enables displaying the structure for debugging.
/// - `Clone`, `PartialEq`: The service hands out copies of stored tasks,
///    and tests compare them.
///
/// Decoding is tolerant so that one odd record never makes the whole file
/// unreadable: non-string text fields are kept as their JSON text, unknown
/// enum values fall back to the default and `created_at` may lack an offset
/// (read as UTC).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,

    #[serde(default, deserialize_with = "text_or_empty")]
    pub title: String,

    #[serde(default, deserialize_with = "text_or_empty")]
    pub description: String,

    // Kept as the raw string the client sent. Only filters validate it.
    #[serde(default, deserialize_with = "optional_text")]
    pub due_date: Option<String>,

    #[serde(default, deserialize_with = "priority_or_default")]
    pub priority: Priority,

    #[serde(default, deserialize_with = "truthy")]
    pub completed: bool,

    #[serde(default, deserialize_with = "theme_or_default")]
    pub theme: Theme,

    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a fresh task with a new id, the current timestamp and
    /// default state (`completed = false`, `theme = standard`).
    pub fn new(
        title: String,
        description: String,
        due_date: Option<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            due_date,
            priority,
            completed: false,
            theme: Theme::default(),
            created_at: Utc::now(),
        }
    }

    /// Applies a partial update. Each field present in the payload is
    /// handled independently; a priority that is not one of the known
    /// values is ignored rather than rejected.
    pub fn apply_update(&mut self, payload: UpdateTaskPayload) {
        if let Some(title) = payload.title {
            self.title = title;
        }
        if let Some(description) = payload.description {
            self.description = description;
        }
        if let Some(due_date) = payload.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = payload.priority.as_ref().and_then(Priority::from_value) {
            self.priority = priority;
        }
        if let Some(completed) = payload.completed {
            self.completed = is_truthy(&completed);
        }
    }
}

/// Task priority. Serialized in lowercase (`"low"`, `"medium"`, `"high"`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Accepts only JSON strings naming a known priority.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::from_name)
    }
}

/// Display theme of a task card in the front end.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Standard,
    Light,
    Darker,
}

impl Theme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::Standard),
            "light" => Some(Self::Light),
            "darker" => Some(Self::Darker),
            _ => None,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::from_name)
    }
}

/// Structure used to receive task creation data from the API.
/// Every field is optional at the wire level; the service decides
/// what is required (`title`) and what falls back to a default.
#[derive(Deserialize, Debug, Default)]
pub struct CreateTaskPayload {
    /// `None` unless the body carried a truthy title.
    #[serde(default, deserialize_with = "truthy_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub due_date: Option<String>,
    // Raw JSON so that an unknown value falls back to the default
    // instead of failing the whole request.
    pub priority: Option<Value>,
}

impl CreateTaskPayload {
    /// Reads any JSON body. Anything that is not an object carries no
    /// title, so the service rejects it like a missing title.
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

/// Partial update of a task. A field that is absent from the body is
/// left untouched.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTaskPayload {
    #[serde(default, deserialize_with = "optional_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub description: Option<String>,
    /// `Some(None)` means the client sent an explicit `null`.
    #[serde(default, deserialize_with = "present_text")]
    pub due_date: Option<Option<String>>,
    pub priority: Option<Value>,
    /// Any JSON value, coerced with [`is_truthy`].
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Value>,
}

/// Body of `PUT /api/tasks/{id}/priority`.
#[derive(Deserialize, Debug, Default)]
pub struct PriorityPayload {
    pub priority: Option<Value>,
}

/// Body of `PUT /api/tasks/{id}/theme`.
#[derive(Deserialize, Debug, Default)]
pub struct ThemePayload {
    pub theme: Option<Value>,
}

/// Raw query string of `GET /api/tasks`, before interpretation.
#[derive(Deserialize, Debug, Default)]
pub struct ListTasksQuery {
    pub completed: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
}

/// Returned when a `due_date` filter is not a valid `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid due date filter: {0}")]
pub struct InvalidDueDate(pub String);

/// Interpreted list filters. Every active predicate must match (logical AND).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub due_date: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// Interprets the raw query. Unrecognized `completed` and `priority`
    /// values disable the corresponding filter; a malformed non-empty
    /// `due_date` is an error.
    pub fn from_query(query: &ListTasksQuery) -> Result<Self, InvalidDueDate> {
        let completed = match query.completed.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };

        let due_date = match query.due_date.as_deref() {
            None | Some("") => None,
            Some(date) if is_valid_due_date(date) => Some(date.to_string()),
            Some(date) => return Err(InvalidDueDate(date.to_string())),
        };

        let priority = query.priority.as_deref().and_then(Priority::from_name);

        Ok(Self {
            completed,
            due_date,
            priority,
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(due_date) = &self.due_date {
            if task.due_date.as_deref() != Some(due_date.as_str()) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        true
    }

    /// Keeps the matching tasks in their original order.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }
}

/// Checks that `value` is a real calendar date in `YYYY-MM-DD` form.
pub fn is_valid_due_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DUE_DATE_FORMAT).is_ok()
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Reads an RFC 3339 timestamp, or an ISO 8601 one without offset as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

// `null` is no text; other non-string values keep their JSON text.
fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// The deserializers below are used with `#[serde(default)]`, so an absent
// field never reaches them.

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Value::deserialize(deserializer).map(text_of)
}

// Present, possibly `null`.
fn present_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<String>>, D::Error> {
    Value::deserialize(deserializer).map(|value| Some(text_of(value)))
}

// Present, possibly `null`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn truthy_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(if is_truthy(&value) { text_of(value) } else { None })
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    optional_text(deserializer).map(Option::unwrap_or_default)
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|value| is_truthy(&value))
}

fn priority_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priority, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(Priority::from_value(&value).unwrap_or_default())
}

fn theme_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Theme, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(Theme::from_value(&value).unwrap_or_default())
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {value}")))
}

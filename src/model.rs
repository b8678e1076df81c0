//! Data models for Wellnest.
//!
//! Tasks and mood entries are owned by a single user. Priority, category and
//! mood are closed vocabularies at the write boundary (the API rejects unknown
//! values), but records read back from storage keep any unrecognized string so
//! that one odd row can never break a report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Priority tier of a task.
///
/// Unrecognized strings are preserved in [`Priority::Unrecognized`] and carry
/// zero scoring weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    Unrecognized(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Priority::Unrecognized(_))
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Unrecognized(raw),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Life area a task belongs to.
///
/// The five built-in areas are the only ones the API accepts, but the
/// vocabulary is open: anything else is kept verbatim in [`Category::Other`]
/// and reported as its own breakdown key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Health,
    Education,
    Leisure,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Health => "health",
            Category::Education => "education",
            Category::Leisure => "leisure",
            Category::Other(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "personal" => Category::Personal,
            "work" => Category::Work,
            "health" => Category::Health,
            "education" => Category::Education,
            "leisure" => Category::Leisure,
            _ => Category::Other(raw),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A to-do item.
///
/// This is both the persisted record and the input of the productivity
/// aggregator, which only looks at `priority`, `completed`, `category` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,

    /// Owner of the task, as supplied by the upstream gateway.
    pub user_id: String,

    pub text: String,

    pub completed: bool,

    pub category: Category,

    pub priority: Priority,

    pub due_date: Option<DateTime<Utc>>,

    /// Manual ordering index; lower comes first.
    pub position: i64,

    pub notes: String,

    /// Creation instant. Day bucketing derives the calendar day from this
    /// through an explicit [`crate::calendar::DayBoundary`].
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /todos`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Required; an empty or missing text is rejected by the handler.
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub category: Option<Category>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for `PUT /todos/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    /// `None` leaves the due date alone; `Some(None)` (an explicit `null`)
    /// clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub notes: Option<String>,
}

/// Distinguish a present `null` from a missing field. Missing fields never
/// reach this function and fall back to `None` via `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One entry of a bulk reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: i64,
    pub position: i64,
}

/// Request body for `POST /todos/positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionsRequest {
    pub todos: Vec<PositionUpdate>,
}

/// Query parameters shared by the analytics endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TimeframeQuery {
    /// `day`, `week`, `month`, `year` or `all`. Absent means all-time.
    pub timeframe: Option<String>,
}

/// A self-reported mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Good,
    Neutral,
    Sad,
    Angry,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Good, Mood::Neutral, Mood::Sad, Mood::Angry];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Mood::ALL.into_iter().find(|mood| mood.as_str() == raw)
    }
}

/// A mood log with an optional journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: i64,
    pub user_id: String,
    pub mood: Mood,
    pub journal: String,
    pub predicted_mood: Option<Mood>,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /mood`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMoodRequest {
    /// Validated by the handler: missing or unknown moods are a 400.
    #[serde(default)]
    pub mood: Option<String>,

    #[serde(default)]
    pub journal: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_known_values() {
        assert_eq!(Priority::from("high".to_string()), Priority::High);
        assert_eq!(Priority::from("medium".to_string()), Priority::Medium);
        assert_eq!(Priority::from("low".to_string()), Priority::Low);
    }

    #[test]
    fn test_priority_unrecognized_is_preserved() {
        let priority = Priority::from("urgent".to_string());
        assert_eq!(priority, Priority::Unrecognized("urgent".to_string()));
        assert!(!priority.is_recognized());
        assert_eq!(String::from(priority), "urgent");
    }

    #[test]
    fn test_category_serde_is_plain_string() {
        let json = serde_json::to_string(&Category::Education).unwrap();
        assert_eq!(json, "\"education\"");

        let other: Category = serde_json::from_str("\"travel\"").unwrap();
        assert_eq!(other, Category::Other("travel".to_string()));
    }

    #[test]
    fn test_create_task_request_defaults() {
        let request: CreateTaskRequest = serde_json::from_str(r#"{"text": "stretch"}"#).unwrap();
        assert_eq!(request.text, "stretch");
        assert!(request.category.is_none());
        assert!(request.priority.is_none());
        assert!(request.due_date.is_none());
    }

    #[test]
    fn test_update_request_due_date_null_vs_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(absent.due_date, None);

        let cleared: UpdateTaskRequest = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: UpdateTaskRequest =
            serde_json::from_str(r#"{"dueDate": "2024-03-20T18:00:00Z"}"#).unwrap();
        assert!(matches!(set.due_date, Some(Some(_))));
    }

    #[test]
    fn test_mood_parse() {
        assert_eq!(Mood::parse("sad"), Some(Mood::Sad));
        assert_eq!(Mood::parse("ecstatic"), None);
        assert_eq!(serde_json::to_string(&Mood::Angry).unwrap(), "\"angry\"");
    }
}

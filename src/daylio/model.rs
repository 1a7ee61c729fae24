//! Typed view of the Daylio backup document.
//!
//! Each record keeps the fields this tool does not model in `extra`, so a
//! record that is read and written back serialises to the same JSON value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEY_DAY_ENTRIES: &str = "dayEntries";
pub const KEY_GOALS: &str = "goals";
pub const KEY_GOAL_ENTRIES: &str = "goalEntries";
pub const KEY_GOAL_SUCCESS_WEEKS: &str = "goalSuccessWeeks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(rename = "dayEntries")]
    pub day_entries: Vec<DayEntry>,
    pub goals: Vec<Goal>,
    #[serde(rename = "goalEntries")]
    pub goal_entries: Vec<GoalEntry>,
    #[serde(rename = "goalSuccessWeeks")]
    pub goal_success_weeks: Vec<GoalSuccessWeek>,
    pub tags: Vec<Tag>,
    pub version: i64,
}

/// A mood entry. Day entries pass through untouched, so every field stays
/// in the JSON map it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayEntry {
    pub fields: Map<String, Value>,
}

/// A goal. Only the fields the importer reads or rewrites are typed; avatar,
/// reminder, repeat and the rest stay in `extra` exactly as loaded, including
/// explicit `null`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "goal_id")]
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Goal {
    /// The tag linked to this goal. Absent and `null` both mean untagged.
    pub fn tag_id(&self) -> Option<i64> {
        self.extra.get("id_tag").and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalEntry {
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
    pub day: i64,
    pub month: i64,
    pub year: i64,
    #[serde(rename = "goalId")]
    pub goal_id: i64,
    pub id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A calendar week in which a goal was completed on every day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSuccessWeek {
    #[serde(rename = "create_at_day")]
    pub sunday_day: i64,
    #[serde(rename = "create_at_month")]
    pub sunday_month: i64,
    #[serde(rename = "create_at_year")]
    pub sunday_year: i64,
    pub goal_id: i64,
    pub week: i64,
    pub year: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

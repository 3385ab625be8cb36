use crate::cell::CellKind;
use crate::stats::MonthlyStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type UserId = u64;
pub type HabitId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub plan: i64,
    #[serde(default)]
    pub archived: Vec<YearMonth>,
}

impl Habit {
    pub fn kind(&self) -> CellKind {
        CellKind::classify(self.unit.as_deref())
    }

    pub fn is_archived(&self, year: i32, month: u32) -> bool {
        self.archived.contains(&YearMonth { year, month })
    }
}

/// A day value as it appears in the data file or on the wire.
///
/// Older clients wrote checkmark glyphs or numeric strings instead of numbers,
/// so every shape is accepted and reduced with [`StoredValue::normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum StoredValue {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

impl From<f64> for StoredValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub user_id: UserId,
    pub habit_id: HabitId,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub user_id: UserId,
    pub habit_id: HabitId,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub value: StoredValue,
}

impl DayRecord {
    pub fn new(key: RecordKey, value: impl Into<StoredValue>) -> Self {
        Self {
            user_id: key.user_id,
            habit_id: key.habit_id,
            year: key.year,
            month: key.month,
            day: key.day,
            value: value.into(),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            user_id: self.user_id,
            habit_id: self.habit_id,
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub user_id: UserId,
    pub date: String,
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub user_id: UserId,
    pub text: String,
    pub sent_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub records: Vec<DayRecord>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub next_habit_id: u64,
    #[serde(default)]
    pub next_task_id: u64,
    #[serde(default)]
    pub next_message_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthQuery {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub user_id: Option<UserId>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewHabitRequest {
    pub user_id: UserId,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub plan: Option<i64>,
}

/// Partial habit edit; absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HabitUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArchiveRequest {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub archived: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertRecordRequest {
    pub user_id: UserId,
    pub habit_id: HabitId,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub value: StoredValue,
}

impl UpsertRecordRequest {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            user_id: self.user_id,
            habit_id: self.habit_id,
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteHabitResponse {
    pub habit_id: HabitId,
    pub records_removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayCell {
    pub day: u32,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitRow {
    pub habit: Habit,
    pub kind: CellKind,
    pub days: Vec<DayCell>,
    pub stats: MonthlyStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthOverview {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub habits: Vec<HabitRow>,
}

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub user_id: UserId,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewTaskRequest {
    pub user_id: UserId,
    pub date: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeRequest {
    pub user_id: UserId,
    pub theme: String,
}

#[derive(Debug, Deserialize)]
pub struct LifeQuery {
    pub birth_date: String,
    pub years: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub after: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewMessageRequest {
    pub user_id: UserId,
    pub text: String,
}

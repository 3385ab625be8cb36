use crate::errors::{AppError, StoreError, ValidationError};
use crate::models::{
    AppData, ChatMessage, DayRecord, Habit, HabitId, HabitUpdate, NewHabitRequest, RecordKey,
    Task, UserId, YearMonth,
};
use crate::theme::KeyValueStore;
use crate::value::sanitize;
use chrono::NaiveDate;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

pub fn parse_date(date: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))
}

fn check_day(key: &RecordKey) -> Result<(), StoreError> {
    NaiveDate::from_ymd_opt(key.year, key.month, key.day)
        .map(|_| ())
        .ok_or(StoreError::InvalidDate {
            year: key.year,
            month: key.month,
            day: key.day,
        })
}

impl AppData {
    pub fn habits_for(&self, user_id: UserId) -> Vec<Habit> {
        self.habits
            .iter()
            .filter(|habit| habit.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn habit(&self, user_id: UserId, habit_id: HabitId) -> Result<&Habit, StoreError> {
        self.habits
            .iter()
            .find(|habit| habit.id == habit_id && habit.user_id == user_id)
            .ok_or(StoreError::HabitNotFound(habit_id))
    }

    fn habit_mut(&mut self, user_id: UserId, habit_id: HabitId) -> Result<&mut Habit, StoreError> {
        self.habits
            .iter_mut()
            .find(|habit| habit.id == habit_id && habit.user_id == user_id)
            .ok_or(StoreError::HabitNotFound(habit_id))
    }

    pub fn create_habit(&mut self, request: NewHabitRequest) -> Result<Habit, ValidationError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let unit = request.unit.trim();
        if unit.is_empty() {
            return Err(ValidationError::EmptyUnit);
        }

        self.next_habit_id += 1;
        let habit = Habit {
            id: self.next_habit_id,
            user_id: request.user_id,
            name: name.to_string(),
            unit: Some(unit.to_string()),
            plan: request.plan.unwrap_or(1).max(0),
            archived: Vec::new(),
        };
        self.habits.push(habit.clone());
        info!(habit_id = habit.id, user_id = habit.user_id, "habit created");
        Ok(habit)
    }

    /// Applies an already validated partial update.
    pub fn update_habit(
        &mut self,
        user_id: UserId,
        habit_id: HabitId,
        update: &HabitUpdate,
    ) -> Result<Habit, StoreError> {
        let habit = self.habit_mut(user_id, habit_id)?;
        if let Some(name) = &update.name {
            habit.name = name.clone();
        }
        if let Some(unit) = &update.unit {
            habit.unit = Some(unit.clone());
        }
        if let Some(plan) = update.plan {
            habit.plan = plan;
        }
        Ok(habit.clone())
    }

    pub fn set_archived(
        &mut self,
        user_id: UserId,
        habit_id: HabitId,
        month: YearMonth,
        archived: bool,
    ) -> Result<Habit, StoreError> {
        let habit = self.habit_mut(user_id, habit_id)?;
        habit.archived.retain(|entry| *entry != month);
        if archived {
            habit.archived.push(month);
            habit.archived.sort();
        }
        Ok(habit.clone())
    }

    /// Removes the habit and every day record attached to it. Returns how many
    /// records went with it.
    pub fn delete_habit(
        &mut self,
        user_id: UserId,
        habit_id: HabitId,
    ) -> Result<usize, StoreError> {
        self.habit(user_id, habit_id)?;
        self.habits
            .retain(|habit| !(habit.id == habit_id && habit.user_id == user_id));
        let before = self.records.len();
        self.records
            .retain(|record| !(record.habit_id == habit_id && record.user_id == user_id));
        Ok(before - self.records.len())
    }

    pub fn records_for(&self, user_id: UserId, year: i32, month: u32) -> Vec<DayRecord> {
        self.records
            .iter()
            .filter(|record| {
                record.user_id == user_id && record.year == year && record.month == month
            })
            .cloned()
            .collect()
    }

    /// Writes one day value. At most one record exists per key; 0 removes it.
    pub fn upsert_record(&mut self, key: RecordKey, value: f64) -> Result<(), StoreError> {
        check_day(&key)?;
        self.habit(key.user_id, key.habit_id)?;

        self.records.retain(|record| record.key() != key);
        let value = sanitize(value);
        if value > 0.0 {
            self.records.push(DayRecord::new(key, value));
        }
        Ok(())
    }

    pub fn delete_record(&mut self, key: RecordKey) -> Result<bool, StoreError> {
        check_day(&key)?;
        self.habit(key.user_id, key.habit_id)?;
        let before = self.records.len();
        self.records.retain(|record| record.key() != key);
        Ok(self.records.len() != before)
    }

    pub fn tasks_for(&self, user_id: UserId, date: NaiveDate) -> Vec<Task> {
        let date = date.to_string();
        self.tasks
            .iter()
            .filter(|task| task.user_id == user_id && task.date == date)
            .cloned()
            .collect()
    }

    pub fn create_task(
        &mut self,
        user_id: UserId,
        date: NaiveDate,
        title: &str,
    ) -> Result<Task, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        self.next_task_id += 1;
        let task = Task {
            id: self.next_task_id,
            user_id,
            date: date.to_string(),
            title: title.to_string(),
            done: false,
        };
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn toggle_task(&mut self, user_id: UserId, task_id: u64) -> Result<Task, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id && task.user_id == user_id)
            .ok_or(StoreError::TaskNotFound(task_id))?;
        task.done = !task.done;
        Ok(task.clone())
    }

    pub fn delete_task(&mut self, user_id: UserId, task_id: u64) -> Result<(), StoreError> {
        let before = self.tasks.len();
        self.tasks
            .retain(|task| !(task.id == task_id && task.user_id == user_id));
        if self.tasks.len() == before {
            return Err(StoreError::TaskNotFound(task_id));
        }
        Ok(())
    }

    pub fn messages_after(&self, after: u64) -> Vec<ChatMessage> {
        self.chat
            .iter()
            .filter(|message| message.id > after)
            .cloned()
            .collect()
    }

    pub fn post_message(
        &mut self,
        user_id: UserId,
        text: &str,
        sent_at: String,
    ) -> Result<ChatMessage, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        self.next_message_id += 1;
        let message = ChatMessage {
            id: self.next_message_id,
            user_id,
            text: text.to_string(),
            sent_at,
        };
        self.chat.push(message.clone());
        Ok(message)
    }
}

impl KeyValueStore for AppData {
    fn get(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.settings.insert(key.to_string(), value);
    }
}

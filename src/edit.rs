use crate::errors::ValidationError;
use crate::models::{Habit, HabitUpdate};

pub const UNIT_PRESETS: [&str; 3] = ["Дни", "Часы", "Кол-во"];

/// Form contents of the habit edit dialog, as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HabitDraft {
    pub name: String,
    pub unit: String,
    pub plan: String,
}

impl HabitDraft {
    pub fn from_habit(habit: &Habit) -> Self {
        Self {
            name: habit.name.clone(),
            unit: habit.unit.clone().unwrap_or_default(),
            plan: habit.plan.to_string(),
        }
    }

    pub fn select_preset(&mut self, index: usize) {
        if let Some(unit) = UNIT_PRESETS.get(index) {
            self.unit = unit.to_string();
        }
    }

    pub fn validate(&self, existing_plan: i64) -> Result<HabitUpdate, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let unit = self.unit.trim();
        if unit.is_empty() {
            return Err(ValidationError::EmptyUnit);
        }
        Ok(HabitUpdate {
            name: Some(name.to_string()),
            unit: Some(unit.to_string()),
            plan: Some(parse_plan(&self.plan, existing_plan)),
        })
    }
}

/// Empty input keeps the current plan, garbage becomes 1, negatives 0.
pub fn parse_plan(input: &str, existing: i64) -> i64 {
    let input = input.trim();
    if input.is_empty() {
        return existing;
    }
    input.parse::<i64>().map(|plan| plan.max(0)).unwrap_or(1)
}

/// Checks a partial update received by the server.
pub fn validate_update(update: &HabitUpdate) -> Result<HabitUpdate, ValidationError> {
    let name = match update.name.as_deref().map(str::trim) {
        Some("") => return Err(ValidationError::EmptyName),
        other => other.map(str::to_string),
    };
    let unit = match update.unit.as_deref().map(str::trim) {
        Some("") => return Err(ValidationError::EmptyUnit),
        other => other.map(str::to_string),
    };
    Ok(HabitUpdate {
        name,
        unit,
        plan: update.plan.map(|plan| plan.max(0)),
    })
}

pub fn confirm_delete(confirmed: bool) -> Result<(), ValidationError> {
    if confirmed {
        Ok(())
    } else {
        Err(ValidationError::DeleteNotConfirmed)
    }
}

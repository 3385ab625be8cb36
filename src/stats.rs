use crate::cell::CellKind;
use crate::models::{AppData, DayCell, DayRecord, Habit, HabitRow, MonthOverview, UserId};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub kind: CellKind,
    pub total: f64,
    pub display: String,
    pub percent: u32,
}

impl MonthlyStats {
    pub fn zero() -> Self {
        Self {
            kind: CellKind::Count,
            total: 0.0,
            display: "0".to_string(),
            percent: 0,
        }
    }
}

/// Monthly total and completion for one habit.
///
/// `records` may hold other habits' rows; only the ones belonging to `habit`
/// are counted. A habit that no longer exists yields zeroed stats.
pub fn monthly_stats(habit: Option<&Habit>, records: &[DayRecord]) -> MonthlyStats {
    let Some(habit) = habit else {
        return MonthlyStats::zero();
    };
    let values = records
        .iter()
        .filter(|record| record.habit_id == habit.id)
        .map(|record| record.value.normalized());
    stats_for_kind(habit.kind(), habit.plan, values)
}

pub fn stats_for_kind(
    kind: CellKind,
    plan: i64,
    values: impl IntoIterator<Item = f64>,
) -> MonthlyStats {
    let (total, display) = match kind {
        CellKind::Check => {
            let days = values.into_iter().filter(|value| *value > 0.0).count() as f64;
            (days, format!("{days}"))
        }
        CellKind::Time => {
            let hours: f64 = values.into_iter().sum();
            (hours, format_hours(hours))
        }
        CellKind::Count => {
            let sum = values.into_iter().sum::<f64>().round();
            (sum, format!("{sum}"))
        }
    };

    MonthlyStats {
        kind,
        total,
        display,
        percent: percent_of_plan(total, plan),
    }
}

/// `round(total / plan * 100)` clamped to 0..=100; a plan of 0 means no goal.
pub fn percent_of_plan(total: f64, plan: i64) -> u32 {
    if plan <= 0 || !total.is_finite() || total <= 0.0 {
        return 0;
    }
    let percent = (total / plan as f64 * 100.0).round();
    percent.min(100.0) as u32
}

pub fn format_hours(hours: f64) -> String {
    if hours >= 1.0 {
        format!("{}ч", hours.floor())
    } else {
        format!("{hours:.1}ч")
    }
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

pub fn current_month() -> (i32, u32) {
    let today = Local::now().date_naive();
    (today.year(), today.month())
}

/// Grid rows for every habit of `user_id` not archived in the given month.
pub fn build_month_overview(
    data: &AppData,
    user_id: UserId,
    year: i32,
    month: u32,
) -> Option<MonthOverview> {
    let days_in_month = days_in_month(year, month)?;
    let records: Vec<DayRecord> = data.records_for(user_id, year, month);

    let habits = data
        .habits
        .iter()
        .filter(|habit| habit.user_id == user_id && !habit.is_archived(year, month))
        .map(|habit| {
            let kind = habit.kind();
            let days = (1..=days_in_month)
                .map(|day| {
                    let value = records
                        .iter()
                        .find(|record| record.habit_id == habit.id && record.day == day)
                        .map(|record| record.value.normalized())
                        .unwrap_or(0.0);
                    DayCell {
                        day,
                        value,
                        display: kind.format_day(value),
                    }
                })
                .collect();
            HabitRow {
                habit: habit.clone(),
                kind,
                days,
                stats: monthly_stats(Some(habit), &records),
            }
        })
        .collect();

    Some(MonthOverview {
        year,
        month,
        days_in_month,
        habits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoredValue;

    fn habit(id: u64, unit: &str, plan: i64) -> Habit {
        Habit {
            id,
            user_id: 1,
            name: format!("habit {id}"),
            unit: Some(unit.to_string()),
            plan,
            archived: Vec::new(),
        }
    }

    fn record(habit_id: u64, day: u32, value: impl Into<StoredValue>) -> DayRecord {
        DayRecord {
            user_id: 1,
            habit_id,
            year: 2025,
            month: 6,
            day,
            value: value.into(),
        }
    }

    #[test]
    fn check_habit_counts_completed_days() {
        let habit = habit(1, "Дни", 20);
        let records: Vec<DayRecord> = (1..=15).map(|day| record(1, day, 1.0)).collect();

        let stats = monthly_stats(Some(&habit), &records);
        assert_eq!(stats.kind, CellKind::Check);
        assert_eq!(stats.total, 15.0);
        assert_eq!(stats.display, "15");
        assert_eq!(stats.percent, 75);
    }

    #[test]
    fn time_habit_floors_hours_and_clamps_percent() {
        let habit = habit(2, "Часы", 10);
        let records = vec![record(2, 1, 5.0), record(2, 2, 7.5)];

        let stats = monthly_stats(Some(&habit), &records);
        assert_eq!(stats.kind, CellKind::Time);
        assert_eq!(stats.total, 12.5);
        assert_eq!(stats.display, "12ч");
        assert_eq!(stats.percent, 100);
    }

    #[test]
    fn time_below_one_hour_keeps_a_decimal() {
        assert_eq!(format_hours(0.3), "0.3ч");
        assert_eq!(format_hours(0.0), "0.0ч");
        assert_eq!(format_hours(1.99), "1ч");
    }

    #[test]
    fn zero_plan_means_zero_percent() {
        let habit = habit(3, "Раз", 0);
        let records = vec![record(3, 1, 50.0)];

        let stats = monthly_stats(Some(&habit), &records);
        assert_eq!(stats.total, 50.0);
        assert_eq!(stats.percent, 0);
    }

    #[test]
    fn count_habit_rounds_the_sum() {
        let habit = habit(4, "Кол-во", 10);
        let records = vec![record(4, 1, 1.4), record(4, 2, StoredValue::Text("2.4".into()))];

        let stats = monthly_stats(Some(&habit), &records);
        assert_eq!(stats.total, 4.0);
        assert_eq!(stats.percent, 40);
    }

    #[test]
    fn legacy_glyphs_count_for_check_habits() {
        let habit = habit(5, "дни", 4);
        let records = vec![
            record(5, 1, StoredValue::Text("✓".into())),
            record(5, 2, StoredValue::Text("v".into())),
            record(5, 3, StoredValue::Text("√".into())),
            record(5, 4, 0.0),
        ];

        let stats = monthly_stats(Some(&habit), &records);
        assert_eq!(stats.total, 3.0);
        assert_eq!(stats.percent, 75);
    }

    #[test]
    fn records_of_other_habits_are_ignored() {
        let habit = habit(6, "Раз", 10);
        let records = vec![record(6, 1, 2.0), record(7, 1, 9.0)];
        assert_eq!(monthly_stats(Some(&habit), &records).total, 2.0);
    }

    #[test]
    fn missing_habit_yields_zero_stats() {
        let records = vec![record(9, 1, 3.0)];
        let stats = monthly_stats(None, &records);
        assert_eq!(stats.total, 0.0);
        assert_eq!(stats.percent, 0);
    }

    #[test]
    fn percent_stays_within_bounds() {
        for plan in [0, 1, 3, 10, 1000] {
            for total in [0.0, 0.4, 1.0, 7.0, 1e9] {
                let percent = percent_of_plan(total, plan);
                assert!(percent <= 100);
                if plan == 0 {
                    assert_eq!(percent, 0);
                }
            }
        }
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
    }

    #[test]
    fn overview_lists_cells_for_every_day() {
        let mut data = AppData::default();
        let mut archived = habit(2, "Раз", 5);
        archived.archived.push(crate::models::YearMonth { year: 2025, month: 6 });
        data.habits.push(habit(1, "Дни", 30));
        data.habits.push(archived);
        data.records.push(record(1, 3, 1.0));

        let overview = build_month_overview(&data, 1, 2025, 6).unwrap();
        assert_eq!(overview.days_in_month, 30);
        assert_eq!(overview.habits.len(), 1);
        let row = &overview.habits[0];
        assert_eq!(row.days.len(), 30);
        assert_eq!(row.days[2].display, "✓");
        assert_eq!(row.days[3].display, "");
        assert_eq!(row.stats.total, 1.0);
    }
}

use crate::errors::ValidationError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIFESPAN_YEARS: u32 = 80;
const WEEKS_PER_YEAR: u64 = 52;

/// Weeks lived out of an expected lifespan, for the life grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeProgress {
    pub weeks_lived: u64,
    pub total_weeks: u64,
    pub percent: f64,
    pub years_lived: u32,
}

impl LifeProgress {
    pub fn compute(
        birth: NaiveDate,
        today: NaiveDate,
        expected_years: u32,
    ) -> Result<Self, ValidationError> {
        if expected_years == 0 {
            return Err(ValidationError::ZeroLifespan);
        }
        if birth > today {
            return Err(ValidationError::BirthInFuture);
        }

        let total_weeks = u64::from(expected_years) * WEEKS_PER_YEAR;
        let weeks_lived = ((today - birth).num_days() as u64 / 7).min(total_weeks);
        let percent = (weeks_lived as f64 / total_weeks as f64 * 1000.0).round() / 10.0;

        Ok(Self {
            weeks_lived,
            total_weeks,
            percent: percent.min(100.0),
            years_lived: full_years(birth, today),
        })
    }
}

fn full_years(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

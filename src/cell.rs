use crate::value::sanitize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How a habit's day values are entered, shown and aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Check,
    Count,
    Time,
}

impl CellKind {
    /// Classifies a free-text unit label.
    ///
    /// Matching is case-insensitive on substrings, checked in the order
    /// hours, counts, days. Anything else, including a missing unit, is a
    /// count.
    pub fn classify(unit: Option<&str>) -> Self {
        let unit = match unit.map(str::trim) {
            Some(unit) if !unit.is_empty() => unit.to_lowercase(),
            _ => return CellKind::Count,
        };

        if unit.contains("час") {
            CellKind::Time
        } else if unit.contains("кол-во") || unit.contains("раз") {
            CellKind::Count
        } else if unit.contains("дн") {
            CellKind::Check
        } else {
            CellKind::Count
        }
    }

    /// Value a cell takes after a single tap.
    pub fn tap(self, current: f64) -> f64 {
        let current = sanitize(current);
        match self {
            CellKind::Check => {
                if current > 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
            CellKind::Count | CellKind::Time => current + 1.0,
        }
    }

    /// Text shown inside a grid cell. Empty days render as an empty string.
    pub fn format_day(self, value: f64) -> String {
        let value = sanitize(value);
        if value == 0.0 {
            return String::new();
        }
        match self {
            CellKind::Check => "✓".to_string(),
            CellKind::Count => format!("{}", value.round()),
            CellKind::Time => format!("{}ч", format_number(value)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CellKind::Check => "check",
            CellKind::Count => "count",
            CellKind::Time => "time",
        }
    }
}

/// Prints whole numbers without a fraction and everything else with at most
/// two decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{value}");
    }
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Parses manual cell input. Comma decimals are accepted; anything else that
/// is not a number becomes 0.
pub fn parse_manual_value(input: &str) -> f64 {
    input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map(sanitize)
        .unwrap_or(0.0)
}

pub fn seconds_to_hours(seconds: u64) -> f64 {
    (seconds as f64 / 3600.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Stops the watch and returns the total elapsed time.
    pub fn stop(&mut self, now: Instant) -> Duration {
        if let Some(started_at) = self.started_at.take() {
            self.elapsed += now.saturating_duration_since(started_at);
        }
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started_at) => self.elapsed + now.saturating_duration_since(started_at),
            None => self.elapsed,
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.elapsed = Duration::ZERO;
    }
}

/// State of the long-press value entry dialog.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    kind: CellKind,
    pub input: String,
    stopwatch: Stopwatch,
}

impl ManualEntry {
    pub fn open(kind: CellKind, current: f64) -> Self {
        Self {
            kind,
            input: format_number(sanitize(current)),
            stopwatch: Stopwatch::default(),
        }
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    /// Only time cells have a stopwatch; returns false for other kinds.
    pub fn start_stopwatch(&mut self, now: Instant) -> bool {
        if self.kind != CellKind::Time {
            return false;
        }
        self.stopwatch.start(now);
        true
    }

    /// Stops the stopwatch and writes the elapsed hours into the input.
    pub fn stop_stopwatch(&mut self, now: Instant) -> Option<f64> {
        if self.kind != CellKind::Time || !self.stopwatch.is_running() {
            return None;
        }
        let hours = seconds_to_hours(self.stopwatch.stop(now).as_secs());
        self.input = format_number(hours);
        Some(hours)
    }

    /// Value to write; 0 clears the day.
    pub fn save(&self) -> f64 {
        parse_manual_value(&self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_hours_as_time_in_any_case() {
        assert_eq!(CellKind::classify(Some("Часы")), CellKind::Time);
        assert_eq!(CellKind::classify(Some("ЧАС")), CellKind::Time);
        assert_eq!(CellKind::classify(Some("полчаса")), CellKind::Time);
    }

    #[test]
    fn classify_counts_and_days() {
        assert_eq!(CellKind::classify(Some("Кол-во")), CellKind::Count);
        assert_eq!(CellKind::classify(Some("Раз")), CellKind::Count);
        assert_eq!(CellKind::classify(Some("Дни")), CellKind::Check);
        assert_eq!(CellKind::classify(Some("дн")), CellKind::Check);
    }

    #[test]
    fn classify_defaults_to_count() {
        assert_eq!(CellKind::classify(None), CellKind::Count);
        assert_eq!(CellKind::classify(Some("")), CellKind::Count);
        assert_eq!(CellKind::classify(Some("   ")), CellKind::Count);
        assert_eq!(CellKind::classify(Some("km")), CellKind::Count);
    }

    #[test]
    fn classify_prefers_time_over_count_over_check() {
        assert_eq!(CellKind::classify(Some("часы в дни")), CellKind::Time);
        assert_eq!(CellKind::classify(Some("раз в дни")), CellKind::Count);
    }

    #[test]
    fn tap_toggles_checks_and_increments_others() {
        assert_eq!(CellKind::Check.tap(0.0), 1.0);
        assert_eq!(CellKind::Check.tap(1.0), 0.0);
        assert_eq!(CellKind::Check.tap(3.0), 0.0);
        assert_eq!(CellKind::Count.tap(0.0), 1.0);
        assert_eq!(CellKind::Count.tap(2.0), 3.0);
        assert_eq!(CellKind::Time.tap(1.5), 2.5);
    }

    #[test]
    fn day_cells_render_per_kind() {
        assert_eq!(CellKind::Check.format_day(0.0), "");
        assert_eq!(CellKind::Check.format_day(1.0), "✓");
        assert_eq!(CellKind::Count.format_day(2.6), "3");
        assert_eq!(CellKind::Time.format_day(1.5), "1.5ч");
        assert_eq!(CellKind::Time.format_day(2.0), "2ч");
    }

    #[test]
    fn manual_values_parse_leniently() {
        assert_eq!(parse_manual_value("2.5"), 2.5);
        assert_eq!(parse_manual_value("1,25"), 1.25);
        assert_eq!(parse_manual_value("abc"), 0.0);
        assert_eq!(parse_manual_value("-4"), 0.0);
    }

    #[test]
    fn manual_entry_is_prefilled_with_current_value() {
        let entry = ManualEntry::open(CellKind::Count, 4.0);
        assert_eq!(entry.input, "4");
        assert_eq!(entry.save(), 4.0);
    }

    #[test]
    fn stopwatch_fills_hours_on_stop() {
        let start = Instant::now();
        let mut entry = ManualEntry::open(CellKind::Time, 0.0);
        assert!(entry.start_stopwatch(start));
        let hours = entry.stop_stopwatch(start + Duration::from_secs(5400));
        assert_eq!(hours, Some(1.5));
        assert_eq!(entry.input, "1.5");
        assert_eq!(entry.save(), 1.5);
    }

    #[test]
    fn stopwatch_is_unavailable_for_non_time_cells() {
        let now = Instant::now();
        let mut entry = ManualEntry::open(CellKind::Check, 1.0);
        assert!(!entry.start_stopwatch(now));
        assert_eq!(entry.stop_stopwatch(now), None);
        assert_eq!(entry.input, "1");
    }

    #[test]
    fn seconds_convert_to_hours_with_two_decimals() {
        assert_eq!(seconds_to_hours(3600), 1.0);
        assert_eq!(seconds_to_hours(60), 0.02);
        assert_eq!(seconds_to_hours(0), 0.0);
    }

    #[test]
    fn stopwatch_accumulates_across_runs() {
        let t0 = Instant::now();
        let mut watch = Stopwatch::default();
        watch.start(t0);
        watch.stop(t0 + Duration::from_secs(10));
        watch.start(t0 + Duration::from_secs(20));
        assert_eq!(watch.elapsed(t0 + Duration::from_secs(25)), Duration::from_secs(15));
        watch.reset();
        assert_eq!(watch.elapsed(t0), Duration::ZERO);
    }
}

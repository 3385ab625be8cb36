use crate::models::StoredValue;

/// Glyphs older clients stored for a completed "check" day.
pub const CHECK_GLYPHS: [&str; 3] = ["✓", "v", "√"];

impl StoredValue {
    /// Reduces any stored shape to a finite, non-negative number.
    pub fn normalized(&self) -> f64 {
        match self {
            StoredValue::Null => 0.0,
            StoredValue::Number(value) => sanitize(*value),
            StoredValue::Text(text) => normalize_text(text),
        }
    }
}

pub fn normalize(value: Option<&StoredValue>) -> f64 {
    value.map(StoredValue::normalized).unwrap_or(0.0)
}

pub fn normalize_text(text: &str) -> f64 {
    let text = text.trim();
    if CHECK_GLYPHS.contains(&text) {
        return 1.0;
    }
    text.parse::<f64>().map(sanitize).unwrap_or(0.0)
}

/// Maps NaN, infinities and negatives to 0.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

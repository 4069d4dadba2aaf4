//! Validation for values typed or nudged in by the user before they reach
//! the sweep controller. Rejected input never mutates state.

use thiserror::Error;

pub const MULTIPLIER_MAX_LEN: usize = 6;
pub const POINTS_MAX_LEN: usize = 4;

/// Largest values the text entries can produce.
pub const MULTIPLIER_LIMIT: f64 = 999_999.0;
pub const POINTS_MAX: usize = 9_999;

pub const INTERVAL_MIN_MS: u64 = 0;
pub const INTERVAL_MAX_MS: u64 = 1000;
pub const INTERVAL_NUDGE_MS: i64 = 50;

pub const INCREMENT_MIN: f64 = 0.05;
pub const INCREMENT_MAX: f64 = 5.0;
pub const INCREMENT_NUDGE: f64 = 0.05;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    #[error("no value entered")]
    Empty,
    #[error("'{0}' is longer than {1} characters")]
    TooLong(String, usize),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("{0} is out of range")]
    OutOfRange(String),
}

fn checked_text(text: &str, max_len: usize) -> Result<&str, ControlError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ControlError::Empty);
    }
    if text.chars().count() > max_len {
        return Err(ControlError::TooLong(text.to_string(), max_len));
    }
    Ok(text)
}

/// Parse a times-table multiplier; fractions are allowed.
pub fn parse_multiplier(text: &str) -> Result<f64, ControlError> {
    let text = checked_text(text, MULTIPLIER_MAX_LEN)?;
    let value: f64 = text
        .parse()
        .map_err(|_| ControlError::NotANumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(ControlError::NotANumber(text.to_string()));
    }
    Ok(value)
}

/// Parse a point count; must be a whole number of at least 1.
pub fn parse_num_points(text: &str) -> Result<i64, ControlError> {
    let text = checked_text(text, POINTS_MAX_LEN)?;
    let value: i64 = text
        .parse()
        .map_err(|_| ControlError::NotANumber(text.to_string()))?;
    if value < 1 {
        return Err(ControlError::OutOfRange(text.to_string()));
    }
    Ok(value)
}

pub fn clamp_interval(millis: u64) -> u64 {
    millis.clamp(INTERVAL_MIN_MS, INTERVAL_MAX_MS)
}

pub fn clamp_increment(increment: f64) -> f64 {
    if increment.is_nan() {
        return INCREMENT_MIN;
    }
    increment.clamp(INCREMENT_MIN, INCREMENT_MAX)
}

/// Move the interval "slider" by `notches` steps.
pub fn step_interval(current: u64, notches: i64) -> u64 {
    let target = current as i64 + notches * INTERVAL_NUDGE_MS;
    clamp_interval(target.max(0) as u64)
}

/// Move the increment "slider" by `notches` steps.
pub fn step_increment(current: f64, notches: i32) -> f64 {
    let target = current + notches as f64 * INCREMENT_NUDGE;
    // Snap to the nudge grid so repeated presses don't accumulate float noise
    clamp_increment((target / INCREMENT_NUDGE).round() * INCREMENT_NUDGE)
}

/// Which controller field a text entry edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTarget {
    Multiplier,
    NumPoints,
}

impl EntryTarget {
    pub fn label(&self) -> &'static str {
        match self {
            EntryTarget::Multiplier => "Times table",
            EntryTarget::NumPoints => "Number of points",
        }
    }

    fn max_len(&self) -> usize {
        match self {
            EntryTarget::Multiplier => MULTIPLIER_MAX_LEN,
            EntryTarget::NumPoints => POINTS_MAX_LEN,
        }
    }
}

/// A validated value ready to hand to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryValue {
    Multiplier(f64),
    NumPoints(i64),
}

/// Single-line numeric text entry shown in the status bar.
#[derive(Debug, Clone)]
pub struct InputField {
    target: EntryTarget,
    text: String,
}

impl InputField {
    pub fn new(target: EntryTarget) -> Self {
        Self {
            target,
            text: String::new(),
        }
    }

    pub fn target(&self) -> EntryTarget {
        self.target
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Accepts digits, sign and decimal point; one character past the limit
    /// is kept so the too-long error can be reported on submit.
    pub fn push(&mut self, ch: char) {
        let allowed = ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+');
        if allowed && self.text.chars().count() <= self.target.max_len() {
            self.text.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn submit(&self) -> Result<EntryValue, ControlError> {
        match self.target {
            EntryTarget::Multiplier => parse_multiplier(&self.text).map(EntryValue::Multiplier),
            EntryTarget::NumPoints => parse_num_points(&self.text).map(EntryValue::NumPoints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_accepts_fractions() {
        assert_eq!(parse_multiplier("2.5"), Ok(2.5));
        assert_eq!(parse_multiplier(" 34 "), Ok(34.0));
    }

    #[test]
    fn multiplier_rejects_garbage() {
        assert_eq!(parse_multiplier(""), Err(ControlError::Empty));
        assert!(matches!(parse_multiplier("abc"), Err(ControlError::NotANumber(_))));
        assert!(matches!(parse_multiplier("1234567"), Err(ControlError::TooLong(_, 6))));
        assert!(matches!(parse_multiplier("inf"), Err(ControlError::NotANumber(_))));
        assert!(matches!(parse_multiplier("NaN"), Err(ControlError::NotANumber(_))));
    }

    #[test]
    fn points_must_be_positive_whole_numbers() {
        assert_eq!(parse_num_points("360"), Ok(360));
        assert!(matches!(parse_num_points("0"), Err(ControlError::OutOfRange(_))));
        assert!(matches!(parse_num_points("-5"), Err(ControlError::OutOfRange(_))));
        assert!(matches!(parse_num_points("2.5"), Err(ControlError::NotANumber(_))));
        assert!(matches!(parse_num_points("10000"), Err(ControlError::TooLong(_, 4))));
    }

    #[test]
    fn sliders_clamp_to_range() {
        assert_eq!(clamp_interval(5000), 1000);
        assert_eq!(step_interval(20, -1), 0);
        assert_eq!(step_interval(980, 1), 1000);
        assert_eq!(step_interval(100, 2), 200);

        assert_eq!(clamp_increment(0.0), INCREMENT_MIN);
        assert_eq!(clamp_increment(9.0), INCREMENT_MAX);
        assert!((step_increment(0.1, 1) - 0.15).abs() < 1e-9);
        assert_eq!(step_increment(0.05, -1), INCREMENT_MIN);
        assert_eq!(step_increment(5.0, 3), INCREMENT_MAX);
    }

    #[test]
    fn input_field_filters_and_submits() {
        let mut field = InputField::new(EntryTarget::Multiplier);
        for ch in "2x.5".chars() {
            field.push(ch);
        }
        assert_eq!(field.text(), "2.5");
        assert_eq!(field.submit(), Ok(EntryValue::Multiplier(2.5)));

        field.backspace();
        field.backspace();
        assert_eq!(field.submit(), Ok(EntryValue::Multiplier(2.0)));
    }

    #[test]
    fn input_field_reports_overlong_entry() {
        let mut field = InputField::new(EntryTarget::NumPoints);
        for ch in "1234567".chars() {
            field.push(ch);
        }
        assert_eq!(field.text(), "12345");
        assert!(matches!(field.submit(), Err(ControlError::TooLong(_, 4))));
    }
}

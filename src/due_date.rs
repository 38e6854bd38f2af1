//! Due-date field state machine.
//!
//! The field accepts `dd/mm/yyyy`. While the user types (1..=9 characters)
//! the value is only reformatted: missing slashes are inserted before the
//! third and sixth characters and nothing is reported as an error, even when
//! the insertion overshoots. Typed input of 10+ characters, a value that
//! formats to exactly 10, or a blur runs the strict check: exact pattern, a
//! real calendar date, and not before the current moment.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Length of a complete `dd/mm/yyyy` value
pub const DUE_DATE_LEN: usize = 10;

const SLASH_POSITIONS: [usize; 2] = [2, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum DueDateError {
    #[error("expected dd/mm/yyyy")]
    Malformed,
    #[error("longer than dd/mm/yyyy")]
    TooLong,
    #[error("not a calendar date")]
    NotACalendarDate,
    #[error("date lies in the past")]
    InPast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum DueDateState {
    Empty,
    /// Partial input; no feedback shown yet
    Typing,
    Valid,
    Error(DueDateError),
}

/// Result handed to the caller after a strict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueDateOutcome {
    pub valid: bool,
    /// The raw value when valid, empty otherwise
    pub value: String,
}

impl DueDateOutcome {
    fn accepted(value: &str) -> Self {
        Self {
            valid: true,
            value: value.to_string(),
        }
    }

    fn rejected() -> Self {
        Self {
            valid: false,
            value: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Same as the last accepted value, nothing re-checked
    Unchanged,
    /// Still typing; `value` is what the field should now display
    Typing { value: String, auto_inserted: bool },
    /// Complete value went through the strict check
    Checked(DueDateOutcome),
}

/// Per-form due-date field.
#[derive(Debug, Clone)]
pub struct DueDateField {
    raw: String,
    state: DueDateState,
    last_good: String,
    pinned_now: Option<NaiveDateTime>,
    checks: usize,
}

impl Default for DueDateField {
    fn default() -> Self {
        Self::new()
    }
}

impl DueDateField {
    pub fn new() -> Self {
        Self {
            raw: String::new(),
            state: DueDateState::Empty,
            last_good: String::new(),
            pinned_now: None,
            checks: 0,
        }
    }

    /// A field that judges "the past" against a fixed moment.
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            pinned_now: Some(now),
            ..Self::new()
        }
    }

    /// Load a stored value (edit form). A real calendar date is accepted as
    /// known-good even when it has already passed.
    pub fn prefill(&mut self, value: &str) {
        self.raw = value.to_string();
        if parse_due_date(value).is_some() {
            self.last_good = value.to_string();
            self.state = DueDateState::Valid;
        } else {
            self.last_good.clear();
            self.state = DueDateState::Typing;
        }
    }

    pub fn value(&self) -> &str {
        &self.raw
    }

    pub fn state(&self) -> DueDateState {
        self.state
    }

    /// Strict checks run so far. Each one logs its verdict.
    pub fn checks_run(&self) -> usize {
        self.checks
    }

    pub fn is_valid(&self) -> bool {
        self.state == DueDateState::Valid
    }

    /// Current outcome without running any check.
    pub fn outcome(&self) -> DueDateOutcome {
        if self.is_valid() {
            DueDateOutcome::accepted(&self.raw)
        } else {
            DueDateOutcome::rejected()
        }
    }

    /// Handle a change of the field's text.
    pub fn input(&mut self, raw: &str) -> InputOutcome {
        if !self.last_good.is_empty() && raw == self.last_good {
            self.raw = raw.to_string();
            self.state = DueDateState::Valid;
            return InputOutcome::Unchanged;
        }

        let len = raw.chars().count();
        if len == 0 {
            self.raw.clear();
            self.state = DueDateState::Empty;
            return InputOutcome::Typing {
                value: String::new(),
                auto_inserted: false,
            };
        }

        if len < DUE_DATE_LEN {
            let formatted = auto_format(raw);
            let auto_inserted = formatted != raw;
            self.raw = formatted;
            // slash insertion can overshoot; that is still typing
            if self.raw.chars().count() != DUE_DATE_LEN {
                self.state = DueDateState::Typing;
                return InputOutcome::Typing {
                    value: self.raw.clone(),
                    auto_inserted,
                };
            }
            if !self.last_good.is_empty() && self.raw == self.last_good {
                self.state = DueDateState::Valid;
                return InputOutcome::Unchanged;
            }
            return InputOutcome::Checked(self.check());
        }

        self.raw = raw.to_string();
        InputOutcome::Checked(self.check())
    }

    /// Handle the field losing focus.
    pub fn blur(&mut self) -> DueDateOutcome {
        if self.is_valid() && self.raw == self.last_good {
            return self.outcome();
        }
        self.check()
    }

    fn now(&self) -> NaiveDateTime {
        self.pinned_now
            .unwrap_or_else(|| Local::now().naive_local())
    }

    fn check(&mut self) -> DueDateOutcome {
        self.checks += 1;
        match validate_due_date(&self.raw, self.now()) {
            Ok(date) => {
                debug!(value = %self.raw, %date, "due date accepted");
                self.state = DueDateState::Valid;
                self.last_good = self.raw.clone();
                DueDateOutcome::accepted(&self.raw)
            }
            Err(err) => {
                debug!(value = %self.raw, error = %err, "due date rejected");
                self.state = DueDateState::Error(err);
                DueDateOutcome::rejected()
            }
        }
    }
}

/// Insert the slashes a partially typed value is missing.
///
/// Scanning stops at the first character that is neither the expected digit
/// nor a slash in a slash position; the rest is kept as typed.
pub fn auto_format(raw: &str) -> String {
    let mut out = String::with_capacity(DUE_DATE_LEN);
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        let position = out.len();
        if SLASH_POSITIONS.contains(&position) {
            if ch == '/' {
                out.push(ch);
                continue;
            }
            if ch.is_ascii_digit() {
                out.push('/');
                out.push(ch);
                continue;
            }
        } else if ch.is_ascii_digit() {
            out.push(ch);
            continue;
        }

        out.push(ch);
        out.extend(chars);
        break;
    }
    out
}

/// Strict check of a complete value against `now`.
pub fn validate_due_date(raw: &str, now: NaiveDateTime) -> Result<NaiveDate, DueDateError> {
    if raw.chars().count() > DUE_DATE_LEN {
        return Err(DueDateError::TooLong);
    }
    let date = parse_components(raw).ok_or(DueDateError::Malformed)?;
    let date = date.ok_or(DueDateError::NotACalendarDate)?;
    if date.and_hms_opt(0, 0, 0).is_some_and(|midnight| midnight < now) {
        return Err(DueDateError::InPast);
    }
    Ok(date)
}

/// Parse a stored `dd/mm/yyyy` value without the "not in the past" rule.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    parse_components(raw).flatten()
}

/// Outer `None`: pattern mismatch. Inner `None`: day/month overflow.
fn parse_components(raw: &str) -> Option<Option<NaiveDate>> {
    let bytes = raw.as_bytes();
    if bytes.len() != DUE_DATE_LEN {
        return None;
    }
    for (idx, byte) in bytes.iter().enumerate() {
        let ok = if SLASH_POSITIONS.contains(&idx) {
            *byte == b'/'
        } else {
            byte.is_ascii_digit()
        };
        if !ok {
            return None;
        }
    }

    let day: u32 = raw[0..2].parse().ok()?;
    let month: u32 = raw[3..5].parse().ok()?;
    let year: i32 = raw[6..10].parse().ok()?;
    Some(NaiveDate::from_ymd_opt(year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn field() -> DueDateField {
        DueDateField::at(noon(2026, 10, 16))
    }

    #[test]
    fn future_date_is_accepted() {
        let mut f = field();
        let outcome = f.input("15/06/2030");
        assert_eq!(
            outcome,
            InputOutcome::Checked(DueDateOutcome {
                valid: true,
                value: "15/06/2030".to_string(),
            })
        );
        assert!(f.is_valid());
    }

    #[test]
    fn overflowing_day_is_rejected() {
        let mut f = DueDateField::at(noon(2025, 1, 1));
        let outcome = f.input("31/02/2026");
        assert_eq!(outcome, InputOutcome::Checked(DueDateOutcome::rejected()));
        assert_eq!(f.state(), DueDateState::Error(DueDateError::NotACalendarDate));
    }

    #[test]
    fn past_date_is_rejected() {
        let mut f = field();
        f.input("15/06/2020");
        assert_eq!(f.state(), DueDateState::Error(DueDateError::InPast));
        assert_eq!(f.outcome().value, "");
    }

    #[test]
    fn today_counts_as_past_once_the_day_started() {
        let mut f = field();
        f.input("16/10/2026");
        assert_eq!(f.state(), DueDateState::Error(DueDateError::InPast));
        f.input("17/10/2026");
        assert!(f.is_valid());
    }

    #[test]
    fn digits_get_slashes_while_typing() {
        let mut f = field();
        let outcome = f.input("1506");
        assert_eq!(
            outcome,
            InputOutcome::Typing {
                value: "15/06".to_string(),
                auto_inserted: true,
            }
        );
        assert_eq!(f.state(), DueDateState::Typing);
        assert_eq!(f.value(), "15/06");
    }

    #[test]
    fn typed_slashes_are_kept() {
        assert_eq!(auto_format("15/"), "15/");
        assert_eq!(auto_format("15/06/2"), "15/06/2");
        assert_eq!(auto_format("1"), "1");
    }

    #[test]
    fn scan_halts_at_first_bad_character() {
        assert_eq!(auto_format("1a23"), "1a23");
        assert_eq!(auto_format("12x4"), "12x4");
        assert_eq!(auto_format("1234-5"), "12/34-5");
        let mut f = field();
        assert!(matches!(f.input("1a"), InputOutcome::Typing { .. }));
        assert_eq!(f.state(), DueDateState::Typing);
    }

    #[test]
    fn nine_digits_become_complete_and_are_checked() {
        let mut f = field();
        // "15062030" grows to "15/06/2030" once both slashes are inserted
        let outcome = f.input("15062030");
        assert_eq!(
            outcome,
            InputOutcome::Checked(DueDateOutcome {
                valid: true,
                value: "15/06/2030".to_string(),
            })
        );
    }

    #[test]
    fn too_long_value_is_an_error() {
        let mut f = field();
        f.input("15/06/20301");
        assert_eq!(f.state(), DueDateState::Error(DueDateError::TooLong));
    }

    #[test]
    fn overshooting_auto_format_keeps_typing() {
        let mut f = field();
        let outcome = f.input("150620301");
        assert_eq!(
            outcome,
            InputOutcome::Typing {
                value: "15/06/20301".to_string(),
                auto_inserted: true,
            }
        );
        assert_eq!(f.state(), DueDateState::Typing);
        assert_eq!(f.checks_run(), 0);
        f.blur();
        assert_eq!(f.state(), DueDateState::Error(DueDateError::TooLong));
    }

    #[test]
    fn blur_on_partial_value_reports_error() {
        let mut f = field();
        f.input("15/06");
        let outcome = f.blur();
        assert!(!outcome.valid);
        assert_eq!(f.state(), DueDateState::Error(DueDateError::Malformed));
    }

    #[test]
    fn blur_on_empty_value_reports_error() {
        let mut f = field();
        assert!(!f.blur().valid);
    }

    #[test]
    fn repeating_last_good_value_is_a_no_op() {
        let mut f = field();
        f.input("15/06/2030");
        assert_eq!(f.input("15/06/2030"), InputOutcome::Unchanged);
        assert_eq!(f.input("15/06/2030"), InputOutcome::Unchanged);
        assert_eq!(f.checks_run(), 1);
        assert!(f.is_valid());
        assert_eq!(f.blur().value, "15/06/2030");
    }

    #[test]
    fn prefilled_past_date_stays_valid_until_changed() {
        let mut f = field();
        f.prefill("01/01/2020");
        assert!(f.is_valid());
        assert_eq!(f.input("01/01/2020"), InputOutcome::Unchanged);
        f.input("01/01/2021");
        assert_eq!(f.state(), DueDateState::Error(DueDateError::InPast));
    }

    #[test]
    fn clearing_the_field_returns_to_empty() {
        let mut f = field();
        f.input("15/06/2030");
        f.input("");
        assert_eq!(f.state(), DueDateState::Empty);
        assert_eq!(f.value(), "");
    }

    #[test]
    fn parse_due_date_ignores_the_clock() {
        assert_eq!(
            parse_due_date("01/01/2000"),
            NaiveDate::from_ymd_opt(2000, 1, 1)
        );
        assert_eq!(parse_due_date("00/01/2000"), None);
        assert_eq!(parse_due_date("1/1/2000"), None);
        assert_eq!(parse_due_date("01/13/2000"), None);
    }
}

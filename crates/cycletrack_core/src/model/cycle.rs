//! Cycle domain model.
//!
//! # Responsibility
//! - Define `CycleRecord` (persisted shape) and `NewCycle` (insert input).
//! - Provide ISO date parsing plus period/cycle length arithmetic.
//! - Normalize free-text fields before they reach storage.
//!
//! # Invariants
//! - `end_date >= start_date` for every record and every accepted input.
//! - `period_length` is the inclusive day count of the period.
//! - `cycle_length` is derived once at insert time and never recomputed.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned, monotonically increasing record identifier.
pub type CycleId = i64;

/// Calendar date layout used on input and in persisted rows.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Years whose `YYYY-MM-DD` text sorts in calendar order. Stored dates are
/// compared as text, so anything outside this range is rejected on input.
pub const MIN_SUPPORTED_YEAR: i32 = 1;
pub const MAX_SUPPORTED_YEAR: i32 = 9999;

/// Layout of SQLite `CURRENT_TIMESTAMP` values (UTC).
pub const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Input validation failures. Always raised before any write happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleValidationError {
    /// A date field was not a valid `YYYY-MM-DD` calendar date.
    MalformedDate { field: &'static str, value: String },
    /// The period ends before it starts.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    /// A date lies outside years 0001..=9999.
    DateOutOfRange { field: &'static str, date: NaiveDate },
}

impl Display for CycleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedDate { field, value } => {
                write!(f, "{field} `{value}` is not a valid YYYY-MM-DD date")
            }
            Self::EndBeforeStart { start, end } => {
                write!(f, "end date {end} cannot be before start date {start}")
            }
            Self::DateOutOfRange { field, date } => write!(
                f,
                "{field} {date} is outside the supported years \
                 {MIN_SUPPORTED_YEAR:04}-{MAX_SUPPORTED_YEAR:04}"
            ),
        }
    }
}

impl Error for CycleValidationError {}

/// One logged period with its derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub id: CycleId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Days since the previous record's start; `None` for the earliest record
    /// known at insert time.
    pub cycle_length: Option<i64>,
    /// Inclusive day count from `start_date` to `end_date`.
    pub period_length: i64,
    /// Display order follows insertion order.
    pub symptoms: Vec<String>,
    pub mood: Option<String>,
    pub flow_level: Option<String>,
    pub notes: Option<String>,
    /// UTC write time. Audit only; analysis always orders by `start_date`.
    pub created_at: NaiveDateTime,
}

/// Input for the "add cycle" operation.
///
/// Fields are public so callers can build the value directly; the store
/// re-runs [`NewCycle::validate`] before persisting either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCycle {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub symptoms: Vec<String>,
    pub mood: Option<String>,
    pub flow_level: Option<String>,
    pub notes: Option<String>,
}

impl NewCycle {
    /// Creates a validated input with no optional observations.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, CycleValidationError> {
        let cycle = Self {
            start_date,
            end_date,
            symptoms: Vec::new(),
            mood: None,
            flow_level: None,
            notes: None,
        };
        cycle.validate()?;
        Ok(cycle)
    }

    /// Parses ISO `YYYY-MM-DD` start/end text into a validated input.
    pub fn parse(start_date: &str, end_date: &str) -> Result<Self, CycleValidationError> {
        let start = parse_iso_date("start_date", start_date)?;
        let end = parse_iso_date("end_date", end_date)?;
        Self::new(start, end)
    }

    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symptoms = symptoms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_flow_level(mut self, flow_level: impl Into<String>) -> Self {
        self.flow_level = Some(flow_level.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Checks the supported year range and the date-order invariant.
    pub fn validate(&self) -> Result<(), CycleValidationError> {
        ensure_supported_year("start_date", self.start_date)?;
        ensure_supported_year("end_date", self.end_date)?;
        if self.end_date < self.start_date {
            return Err(CycleValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Inclusive period length in days.
    pub fn period_length(&self) -> i64 {
        period_length(self.start_date, self.end_date)
    }
}

/// Parses a strict ISO calendar date, tagging failures with the field name.
pub fn parse_iso_date(field: &'static str, value: &str) -> Result<NaiveDate, CycleValidationError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT).map_err(|_| {
        CycleValidationError::MalformedDate {
            field,
            value: trimmed.to_string(),
        }
    })
}

fn ensure_supported_year(field: &'static str, date: NaiveDate) -> Result<(), CycleValidationError> {
    if (MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&date.year()) {
        Ok(())
    } else {
        Err(CycleValidationError::DateOutOfRange { field, date })
    }
}

/// Signed day difference `to - from`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Inclusive day count of a period (`end - start + 1`).
pub fn period_length(start: NaiveDate, end: NaiveDate) -> i64 {
    days_between(start, end) + 1
}

/// Trims symptom tags, drops blanks and removes duplicates keeping the first
/// occurrence.
pub fn normalize_symptoms(symptoms: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(symptoms.len());
    for symptom in symptoms {
        let trimmed = symptom.trim();
        if trimmed.is_empty() || normalized.iter().any(|seen| seen == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

/// Trims optional free text; blank values collapse to `None`.
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).unwrap()
    }

    #[test]
    fn period_length_is_inclusive() {
        assert_eq!(period_length(date("2024-01-01"), date("2024-01-05")), 5);
        assert_eq!(period_length(date("2024-01-01"), date("2024-01-01")), 1);
        assert_eq!(period_length(date("2024-02-26"), date("2024-03-01")), 5);
    }

    #[test]
    fn parse_rejects_malformed_dates() {
        let err = NewCycle::parse("2024-13-01", "2024-01-05").unwrap_err();
        assert_eq!(
            err,
            CycleValidationError::MalformedDate {
                field: "start_date",
                value: "2024-13-01".to_string(),
            }
        );

        let err = NewCycle::parse("2024-01-01", "next tuesday").unwrap_err();
        assert!(matches!(
            err,
            CycleValidationError::MalformedDate {
                field: "end_date",
                ..
            }
        ));
    }

    #[test]
    fn parse_rejects_end_before_start() {
        let err = NewCycle::parse("2024-01-05", "2024-01-01").unwrap_err();
        assert_eq!(
            err,
            CycleValidationError::EndBeforeStart {
                start: date("2024-01-05"),
                end: date("2024-01-01"),
            }
        );
        assert!(err.to_string().contains("cannot be before"));
    }

    #[test]
    fn signed_years_outside_four_digits_are_rejected() {
        let err = NewCycle::parse("+10000-01-01", "+10000-01-05").unwrap_err();
        assert!(matches!(
            err,
            CycleValidationError::DateOutOfRange {
                field: "start_date",
                ..
            }
        ));

        let err = NewCycle::parse("0001-01-01", "-0002-01-01");
        assert!(err.is_err());

        let boundary = NewCycle::parse("9999-12-27", "9999-12-31").unwrap();
        assert_eq!(boundary.period_length(), 5);
    }

    #[test]
    fn normalize_symptoms_keeps_first_occurrence_order() {
        let input = vec![
            " Cramps ".to_string(),
            "Headache".to_string(),
            "".to_string(),
            "Cramps".to_string(),
            "Fatigue".to_string(),
        ];
        assert_eq!(
            normalize_symptoms(&input),
            vec!["Cramps", "Headache", "Fatigue"]
        );
    }

    #[test]
    fn normalize_text_collapses_blank_values() {
        assert_eq!(normalize_text(Some("  ")), None);
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some(" Heavy ")).as_deref(), Some("Heavy"));
    }
}

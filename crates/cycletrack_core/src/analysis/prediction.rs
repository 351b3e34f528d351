//! Next-period prediction and fertility window heuristics.
//!
//! # Invariants
//! - Only the newest [`PREDICTION_WINDOW`] records take part in a prediction.
//! - The fractional part of the average cycle length is truncated when it is
//!   added to the latest start date (floor; averages are positive), so the
//!   same records always produce the same date.
//! - The fertility window is a fixed heuristic and is always derivable from a
//!   predicted start.

use crate::model::cycle::{days_between, CycleRecord};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Number of most recent records the moving average looks at.
pub const PREDICTION_WINDOW: usize = 6;

const LUTEAL_PHASE_DAYS: i64 = 14;
const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;
const APPROACHING_SOON_DAYS: i64 = 7;

/// A successful forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextPeriodPrediction {
    pub predicted_start: NaiveDate,
    pub avg_cycle_length: f64,
    /// Number of records that contributed a cycle length.
    pub sample_size: usize,
    pub explanation: String,
}

/// Why no forecast could be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientReason {
    /// Fewer than two records are stored.
    InsufficientHistory,
    /// None of the recent records carries a cycle length.
    NoCycleLengthData,
    /// The forecast falls outside the representable calendar.
    DateOutOfRange,
}

impl InsufficientReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::InsufficientHistory => "Need more cycle data for accurate prediction",
            Self::NoCycleLengthData => "No cycle length data available",
            Self::DateOutOfRange => "Predicted date is outside the supported calendar range",
        }
    }
}

impl Display for InsufficientReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of [`predict_next_period`].
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Predicted(NextPeriodPrediction),
    Insufficient(InsufficientReason),
}

impl Prediction {
    pub fn predicted(&self) -> Option<&NextPeriodPrediction> {
        match self {
            Self::Predicted(prediction) => Some(prediction),
            Self::Insufficient(_) => None,
        }
    }

    /// Explanation for a forecast, or the reason there is none.
    pub fn message(&self) -> &str {
        match self {
            Self::Predicted(prediction) => prediction.explanation.as_str(),
            Self::Insufficient(reason) => reason.message(),
        }
    }
}

/// Heuristic conception window around the predicted ovulation day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FertilityWindow {
    pub ovulation_date: NaiveDate,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// How close a predicted start is to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    /// Seven days away or less (including overdue predictions).
    ApproachingSoon,
    Upcoming,
}

impl PredictionStatus {
    pub fn from_days_until(days: i64) -> Self {
        if days <= APPROACHING_SOON_DAYS {
            Self::ApproachingSoon
        } else {
            Self::Upcoming
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ApproachingSoon => "Approaching Soon",
            Self::Upcoming => "Upcoming",
        }
    }
}

/// Predicts the next period start from records ordered newest first, as
/// returned by `CycleStore::get_cycles`.
pub fn predict_next_period(records: &[CycleRecord]) -> Prediction {
    let window = &records[..records.len().min(PREDICTION_WINDOW)];
    if window.len() < 2 {
        return Prediction::Insufficient(InsufficientReason::InsufficientHistory);
    }

    let lengths: Vec<i64> = window
        .iter()
        .filter_map(|record| record.cycle_length)
        .collect();
    if lengths.is_empty() {
        return Prediction::Insufficient(InsufficientReason::NoCycleLengthData);
    }

    let avg_cycle_length = lengths.iter().sum::<i64>() as f64 / lengths.len() as f64;
    let Some(latest_start) = window.iter().map(|record| record.start_date).max() else {
        return Prediction::Insufficient(InsufficientReason::InsufficientHistory);
    };

    let offset_days = avg_cycle_length.floor() as i64;
    let Some(predicted_start) = Duration::try_days(offset_days)
        .and_then(|offset| latest_start.checked_add_signed(offset))
    else {
        return Prediction::Insufficient(InsufficientReason::DateOutOfRange);
    };

    Prediction::Predicted(NextPeriodPrediction {
        predicted_start,
        avg_cycle_length,
        sample_size: lengths.len(),
        explanation: format!(
            "Based on {} cycles, average {:.1} days",
            lengths.len(),
            avg_cycle_length
        ),
    })
}

/// Ovulation is assumed 14 days before the predicted start; the window spans
/// five days before it through one day after.
pub fn fertility_window(predicted_start: NaiveDate) -> FertilityWindow {
    let ovulation_date = predicted_start - Duration::days(LUTEAL_PHASE_DAYS);
    FertilityWindow {
        ovulation_date,
        window_start: ovulation_date - Duration::days(FERTILE_DAYS_BEFORE_OVULATION),
        window_end: ovulation_date + Duration::days(FERTILE_DAYS_AFTER_OVULATION),
    }
}

/// Signed number of days from `today` to `predicted_start`.
pub fn days_until(predicted_start: NaiveDate, today: NaiveDate) -> i64 {
    days_between(today, predicted_start)
}

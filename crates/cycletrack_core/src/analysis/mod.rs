//! Pure computation over cycle record snapshots.
//!
//! # Responsibility
//! - Predict the next period start from recent cycle lengths.
//! - Derive the heuristic fertility window from a prediction.
//! - Aggregate symptom and cycle-length distributions for display.
//!
//! # Invariants
//! - Stateless: every function depends only on its arguments.
//! - Records are never mutated; inputs are borrowed slices.
//! - Missing history is a normal result (`Prediction::Insufficient`), not an
//!   error.

pub mod aggregate;
pub mod prediction;

pub use aggregate::{cycle_length_histogram, symptom_frequency, LengthBucket, SymptomCount};
pub use prediction::{
    days_until, fertility_window, predict_next_period, FertilityWindow, InsufficientReason,
    NextPeriodPrediction, Prediction, PredictionStatus, PREDICTION_WINDOW,
};

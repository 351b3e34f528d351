//! Cycle tracking use-case service.
//!
//! # Responsibility
//! - Provide the entry points a rendering layer needs: log a period, list
//!   history, show statistics, forecast, export.
//! - Feed store snapshots into the pure analyzer functions.
//!
//! # Invariants
//! - Service APIs never bypass store validation.
//! - The service holds no state besides its store and history window.

use crate::analysis::{
    cycle_length_histogram, fertility_window, predict_next_period, symptom_frequency,
    FertilityWindow, InsufficientReason, LengthBucket, NextPeriodPrediction, Prediction,
    SymptomCount, PREDICTION_WINDOW,
};
use crate::export::{write_csv, ExportError};
use crate::model::cycle::{CycleId, CycleRecord, NewCycle};
use crate::repo::cycle_repo::{
    CycleStats, CycleStore, RepoError, RepoResult, CYCLES_DEFAULT_LIMIT,
};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

/// Service error for use-cases that span more than the store.
#[derive(Debug)]
pub enum CycleServiceError {
    Repo(RepoError),
    Export(ExportError),
}

impl Display for CycleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CycleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Export(err) => Some(err),
        }
    }
}

impl From<RepoError> for CycleServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ExportError> for CycleServiceError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

/// A forecast together with its derived fertility window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilityOutlook {
    pub prediction: NextPeriodPrediction,
    #[serde(rename = "fertility_window")]
    pub window: FertilityWindow,
}

/// Use-case facade over a [`CycleStore`].
pub struct CycleService<S: CycleStore> {
    store: S,
    history_limit: u32,
}

impl<S: CycleStore> CycleService<S> {
    /// Creates a service using the default history window.
    pub fn new(store: S) -> Self {
        Self::with_history_limit(store, CYCLES_DEFAULT_LIMIT)
    }

    /// Creates a service whose history/aggregate views read `history_limit`
    /// records. Zero falls back to the store default.
    pub fn with_history_limit(store: S, history_limit: u32) -> Self {
        Self {
            store,
            history_limit,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the service and hands the store back, e.g. to close it.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Logs one period. Validation failures leave the store unchanged.
    pub fn add_cycle(&self, cycle: &NewCycle) -> RepoResult<CycleId> {
        self.store.add_cycle(cycle)
    }

    /// Lists records newest first. `None` uses the configured history window.
    pub fn history(&self, limit: Option<u32>) -> RepoResult<Vec<CycleRecord>> {
        self.store.get_cycles(Some(limit.unwrap_or(self.history_limit)))
    }

    pub fn previous_cycle(&self, date: NaiveDate) -> RepoResult<Option<CycleRecord>> {
        self.store.get_previous_cycle(date)
    }

    pub fn stats(&self) -> RepoResult<CycleStats> {
        self.store.get_cycle_stats()
    }

    /// Forecasts the next period from the most recent records.
    pub fn predict(&self) -> RepoResult<Prediction> {
        let recent = self.store.get_cycles(Some(PREDICTION_WINDOW as u32))?;
        let prediction = predict_next_period(&recent);
        match &prediction {
            Prediction::Predicted(predicted) => info!(
                "event=cycle_predict module=service status=ok sample_size={} window={}",
                predicted.sample_size,
                recent.len()
            ),
            Prediction::Insufficient(reason) => info!(
                "event=cycle_predict module=service status=insufficient window={} reason={:?}",
                recent.len(),
                reason
            ),
        }
        Ok(prediction)
    }

    /// Forecast plus fertility window, or the reason no forecast exists.
    pub fn fertility_outlook(&self) -> RepoResult<Result<FertilityOutlook, InsufficientReason>> {
        Ok(match self.predict()? {
            Prediction::Predicted(prediction) => Ok(FertilityOutlook {
                window: fertility_window(prediction.predicted_start),
                prediction,
            }),
            Prediction::Insufficient(reason) => Err(reason),
        })
    }

    pub fn symptom_frequency(&self) -> RepoResult<Vec<SymptomCount>> {
        Ok(symptom_frequency(&self.history(None)?))
    }

    pub fn cycle_length_histogram(&self) -> RepoResult<Vec<LengthBucket>> {
        Ok(cycle_length_histogram(&self.history(None)?))
    }

    /// Writes the history window as CSV and returns the row count.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, CycleServiceError> {
        let records = self.history(None)?;
        let rows = write_csv(&records, writer)?;
        debug!("event=cycle_export module=service status=ok format=csv rows={rows}");
        Ok(rows)
    }
}

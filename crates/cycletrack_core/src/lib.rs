//! Core domain logic for CycleTrack.
//! This crate is the single source of truth for cycle tracking invariants.

pub mod analysis;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use analysis::{
    cycle_length_histogram, days_until, fertility_window, predict_next_period, symptom_frequency,
    FertilityWindow, InsufficientReason, LengthBucket, NextPeriodPrediction, Prediction,
    PredictionStatus, SymptomCount, PREDICTION_WINDOW,
};
pub use config::{AppConfig, ConfigError};
pub use export::{write_csv, ExportError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LogLevel};
pub use model::cycle::{CycleId, CycleRecord, CycleValidationError, NewCycle};
pub use repo::cycle_repo::{
    CycleStats, CycleStore, ErrorKind, RepoError, RepoResult, SqliteCycleStore,
    CYCLES_DEFAULT_LIMIT,
};
pub use service::cycle_service::{CycleService, CycleServiceError, FertilityOutlook};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

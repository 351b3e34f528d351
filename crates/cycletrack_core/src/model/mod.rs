//! Domain model for logged menstrual cycles.
//!
//! # Responsibility
//! - Define the cycle record and the validated input used to create one.
//! - Own date parsing and length derivation rules shared by store and analyzer.
//!
//! # Invariants
//! - Every persisted record is identified by a store-assigned `CycleId`.
//! - Records are append-only: no update or delete path exists.

pub mod cycle;

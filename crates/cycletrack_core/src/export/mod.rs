//! Flat export of cycle history.
//!
//! # Responsibility
//! - Serialize a read-only snapshot of records into tabular text formats.
//!
//! # Invariants
//! - Export never touches the store; callers pass the records to write.

pub mod csv;

pub use csv::{write_csv, ExportError, CSV_HEADER};

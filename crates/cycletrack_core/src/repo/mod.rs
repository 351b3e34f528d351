//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the cycle store contract used by services and the CLI.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Write paths must call `NewCycle::validate()` before persistence.
//! - Repository APIs separate validation failures from storage failures
//!   (see `RepoError::kind`).

pub mod cycle_repo;

//! Cycle database bootstrap.
//!
//! # Responsibility
//! - Open SQLite connections and bring them to the current cycle schema.
//! - Verify that a connection exposes every table and index the cycle
//!   queries rely on.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Cycle data is never read or written before [`migrations::verify_cycle_schema`]
//!   succeeds.
//! - The `cycles` table layout only ever grows (additive columns).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{verify_cycle_schema, SchemaObject, CYCLE_SCHEMA_VERSION};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build of the tracker.
    SchemaTooNew { found: u32, supported: u32 },
    /// The connection has not been migrated to the current cycle schema.
    SchemaBehind { found: u32, expected: u32 },
    /// A table or index the cycle queries depend on is absent.
    MissingSchemaObject(SchemaObject),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "cycle database failure: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "cycle database uses schema {found}; this build reads up to {supported}"
            ),
            Self::SchemaBehind { found, expected } => write!(
                f,
                "cycle database is at schema {found}, expected {expected}; open it with db::open_db to migrate"
            ),
            Self::MissingSchemaObject(object) => write!(
                f,
                "cycle database is missing {} `{}`",
                object.kind, object.name
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::SchemaBehind { .. } | Self::MissingSchemaObject(_) => {
                None
            }
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

//! Cycle schema steps and verification.
//!
//! # Invariants
//! - Step versions increase strictly and the last one equals
//!   [`CYCLE_SCHEMA_VERSION`].
//! - Pending steps and the post-migration check run in one transaction; a
//!   step that leaves the schema incomplete is rolled back.
//! - Steps only add tables, columns or indexes, so persisted cycle rows stay
//!   readable by every later version.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version this build reads and writes.
pub const CYCLE_SCHEMA_VERSION: u32 = 1;

/// A named SQLite object the cycle queries depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaObject {
    /// `sqlite_master.type`: `table` or `index`.
    pub kind: &'static str,
    pub name: &'static str,
}

/// `cycles` holds the records; the start-date index backs the antecedent
/// lookup and the newest-first listing.
pub const CYCLE_SCHEMA_OBJECTS: &[SchemaObject] = &[
    SchemaObject {
        kind: "table",
        name: "cycles",
    },
    SchemaObject {
        kind: "index",
        name: "idx_cycles_start_date",
    },
];

const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Version change performed while opening a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
}

impl MigrationReport {
    pub fn applied(&self) -> bool {
        self.from_version != self.to_version
    }
}

/// Brings `conn` to [`CYCLE_SCHEMA_VERSION`] and verifies the result.
pub fn migrate(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version = read_schema_version(conn)?;
    if from_version > CYCLE_SCHEMA_VERSION {
        return Err(DbError::SchemaTooNew {
            found: from_version,
            supported: CYCLE_SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    for (version, sql) in SCHEMA_STEPS {
        if *version > from_version {
            tx.execute_batch(sql)?;
            tx.execute_batch(&format!("PRAGMA user_version = {version};"))?;
        }
    }
    verify_cycle_schema(&tx)?;
    tx.commit()?;

    Ok(MigrationReport {
        from_version,
        to_version: CYCLE_SCHEMA_VERSION,
    })
}

/// Checks that `conn` is at the current cycle schema version and exposes
/// every object in [`CYCLE_SCHEMA_OBJECTS`].
pub fn verify_cycle_schema(conn: &Connection) -> DbResult<()> {
    let found = read_schema_version(conn)?;
    if found > CYCLE_SCHEMA_VERSION {
        return Err(DbError::SchemaTooNew {
            found,
            supported: CYCLE_SCHEMA_VERSION,
        });
    }
    if found < CYCLE_SCHEMA_VERSION {
        return Err(DbError::SchemaBehind {
            found,
            expected: CYCLE_SCHEMA_VERSION,
        });
    }

    for object in CYCLE_SCHEMA_OBJECTS {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2);",
            [object.kind, object.name],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::MissingSchemaObject(*object));
        }
    }
    Ok(())
}

fn read_schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{CYCLE_SCHEMA_VERSION, SCHEMA_STEPS};

    #[test]
    fn steps_are_ordered_and_end_at_current_version() {
        let versions: Vec<u32> = SCHEMA_STEPS.iter().map(|(version, _)| *version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(versions.last().copied(), Some(CYCLE_SCHEMA_VERSION));
    }
}

//! Cycle store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist cycle records and answer ordered/aggregate queries.
//! - Derive `period_length` and `cycle_length` at insert time.
//! - Serialize access to the underlying connection within one process.
//!
//! # Invariants
//! - Write paths validate input before opening a transaction.
//! - The antecedent lookup and the insert run in one immediate transaction,
//!   so readers never observe a partially written record.
//! - `cycle_length` is never recomputed after insert, even when an earlier
//!   record is backfilled later.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::{open_db, open_db_in_memory, verify_cycle_schema, DbError};
use crate::model::cycle::{
    days_between, normalize_symptoms, normalize_text, CycleId, CycleRecord,
    CycleValidationError, NewCycle, ISO_DATE_FORMAT, SQLITE_TIMESTAMP_FORMAT,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// Row cap applied when callers do not pass an explicit limit.
pub const CYCLES_DEFAULT_LIMIT: u32 = 50;

const CYCLE_SELECT_SQL: &str = "SELECT
    id,
    start_date,
    end_date,
    cycle_length,
    period_length,
    symptoms,
    mood,
    flow_level,
    notes,
    created_at
FROM cycles";

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse classification surfaced to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was written and the user can correct and retry.
    Validation,
    /// Persistence failed or holds unreadable data.
    Storage,
}

/// Error for cycle persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CycleValidationError),
    Db(DbError),
    InvalidData(String),
    LockPoisoned,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Db(_) | Self::InvalidData(_) | Self::LockPoisoned => ErrorKind::Storage,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted cycle data: {message}"),
            Self::LockPoisoned => write!(f, "cycle store connection lock is poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<CycleValidationError> for RepoError {
    fn from(value: CycleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Aggregate over records whose `cycle_length` is set.
///
/// Every field, `total_cycles` and the date bounds included, is computed over
/// that filtered subset, not the whole history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStats {
    pub avg_cycle_length: Option<f64>,
    pub avg_period_length: Option<f64>,
    pub total_cycles: u32,
    pub first_record_date: Option<NaiveDate>,
    pub last_record_date: Option<NaiveDate>,
}

/// Durable, queryable collection of cycle records.
pub trait CycleStore {
    /// Validates and appends one record, returning its new id.
    fn add_cycle(&self, cycle: &NewCycle) -> RepoResult<CycleId>;
    /// Records ordered by `start_date` descending. `None` or `Some(0)` applies
    /// [`CYCLES_DEFAULT_LIMIT`].
    fn get_cycles(&self, limit: Option<u32>) -> RepoResult<Vec<CycleRecord>>;
    /// Record with the greatest `start_date` strictly before `date`. When
    /// several share that start date, which one is returned is unspecified.
    fn get_previous_cycle(&self, date: NaiveDate) -> RepoResult<Option<CycleRecord>>;
    fn get_cycle_stats(&self) -> RepoResult<CycleStats>;
    /// Total number of stored records.
    fn count_cycles(&self) -> RepoResult<u32>;
}

impl<T: CycleStore + ?Sized> CycleStore for &T {
    fn add_cycle(&self, cycle: &NewCycle) -> RepoResult<CycleId> {
        (**self).add_cycle(cycle)
    }

    fn get_cycles(&self, limit: Option<u32>) -> RepoResult<Vec<CycleRecord>> {
        (**self).get_cycles(limit)
    }

    fn get_previous_cycle(&self, date: NaiveDate) -> RepoResult<Option<CycleRecord>> {
        (**self).get_previous_cycle(date)
    }

    fn get_cycle_stats(&self) -> RepoResult<CycleStats> {
        (**self).get_cycle_stats()
    }

    fn count_cycles(&self) -> RepoResult<u32> {
        (**self).count_cycles()
    }
}

/// SQLite-backed cycle store.
///
/// Owns its connection behind a mutex, so one instance can be shared across
/// threads of the same process with one operation running at a time.
#[derive(Debug)]
pub struct SqliteCycleStore {
    conn: Mutex<Connection>,
}

impl SqliteCycleStore {
    /// Opens (or creates) the database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let conn = open_db(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Wraps a connection that was already bootstrapped by `db::open_db`.
    ///
    /// # Errors
    /// - `Db(SchemaBehind)` when migrations have not been applied.
    /// - `Db(SchemaTooNew)` when the schema is newer than this binary.
    /// - `Db(MissingSchemaObject)` when the `cycles` table or its start-date
    ///   index is absent.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        verify_cycle_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Closes the underlying connection, surfacing any flush failure.
    pub fn close(self) -> RepoResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| RepoError::LockPoisoned)?;
        conn.close().map_err(|(_, err)| {
            error!("event=db_close module=repo status=error error={err}");
            RepoError::from(err)
        })?;
        info!("event=db_close module=repo status=ok");
        Ok(())
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            error!("event=db_lock module=repo status=error error_code=lock_poisoned");
            RepoError::LockPoisoned
        })
    }
}

impl CycleStore for SqliteCycleStore {
    fn add_cycle(&self, cycle: &NewCycle) -> RepoResult<CycleId> {
        cycle.validate()?;

        let started_at = Instant::now();
        let symptoms = encode_symptoms(&normalize_symptoms(&cycle.symptoms))?;
        let period_length = cycle.period_length();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cycle_length = select_previous(&tx, cycle.start_date)?
            .map(|previous| days_between(previous.start_date, cycle.start_date));

        tx.execute(
            "INSERT INTO cycles (
                start_date,
                end_date,
                cycle_length,
                period_length,
                symptoms,
                mood,
                flow_level,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                format_date(cycle.start_date),
                format_date(cycle.end_date),
                cycle_length,
                period_length,
                symptoms,
                normalize_text(cycle.mood.as_deref()),
                normalize_text(cycle.flow_level.as_deref()),
                normalize_text(cycle.notes.as_deref()),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "event=cycle_add module=repo status=ok cycle_id={} has_cycle_length={} duration_ms={}",
            id,
            cycle_length.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(id)
    }

    fn get_cycles(&self, limit: Option<u32>) -> RepoResult<Vec<CycleRecord>> {
        let limit = normalize_cycle_limit(limit);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{CYCLE_SELECT_SQL}
             ORDER BY start_date DESC, id DESC
             LIMIT ?1;"
        ))?;

        let mut rows = stmt.query([i64::from(limit)])?;
        let mut cycles = Vec::new();
        while let Some(row) = rows.next()? {
            cycles.push(parse_cycle_row(row)?);
        }
        Ok(cycles)
    }

    fn get_previous_cycle(&self, date: NaiveDate) -> RepoResult<Option<CycleRecord>> {
        let conn = self.lock()?;
        select_previous(&conn, date)
    }

    fn get_cycle_stats(&self) -> RepoResult<CycleStats> {
        let conn = self.lock()?;
        let (avg_cycle_length, avg_period_length, total_cycles, first, last) = conn.query_row(
            "SELECT
                AVG(cycle_length),
                AVG(period_length),
                COUNT(*),
                MIN(start_date),
                MAX(start_date)
             FROM cycles
             WHERE cycle_length IS NOT NULL;",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?;

        Ok(CycleStats {
            avg_cycle_length,
            avg_period_length,
            total_cycles,
            first_record_date: first
                .map(|value| parse_stored_date("start_date", &value))
                .transpose()?,
            last_record_date: last
                .map(|value| parse_stored_date("start_date", &value))
                .transpose()?,
        })
    }

    fn count_cycles(&self) -> RepoResult<u32> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM cycles;", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Applies the default row cap for missing or zero limits.
pub fn normalize_cycle_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => CYCLES_DEFAULT_LIMIT,
        Some(value) => value,
    }
}

fn select_previous(conn: &Connection, date: NaiveDate) -> RepoResult<Option<CycleRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{CYCLE_SELECT_SQL}
         WHERE start_date < ?1
         ORDER BY start_date DESC
         LIMIT 1;"
    ))?;

    stmt.query_row([format_date(date)], |row| Ok(parse_cycle_row(row)))
        .optional()?
        .transpose()
}

fn parse_cycle_row(row: &Row<'_>) -> RepoResult<CycleRecord> {
    let start_date = parse_stored_date("start_date", &row.get::<_, String>("start_date")?)?;
    let end_date = parse_stored_date("end_date", &row.get::<_, String>("end_date")?)?;
    if end_date < start_date {
        return Err(RepoError::InvalidData(format!(
            "cycles.end_date {end_date} precedes cycles.start_date {start_date}"
        )));
    }

    let symptoms = match row.get::<_, Option<String>>("symptoms")? {
        Some(raw) => decode_symptoms(&raw)?,
        None => Vec::new(),
    };

    let created_text: String = row.get("created_at")?;
    let created_at = NaiveDateTime::parse_from_str(&created_text, SQLITE_TIMESTAMP_FORMAT)
        .map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{created_text}` in cycles.created_at"
            ))
        })?;

    Ok(CycleRecord {
        id: row.get("id")?,
        start_date,
        end_date,
        cycle_length: row.get("cycle_length")?,
        period_length: row.get("period_length")?,
        symptoms,
        mood: row.get("mood")?,
        flow_level: row.get("flow_level")?,
        notes: row.get("notes")?,
        created_at,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

fn parse_stored_date(column: &str, value: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{value}` in cycles.{column}"))
    })
}

fn encode_symptoms(symptoms: &[String]) -> RepoResult<Option<String>> {
    if symptoms.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(symptoms)
        .map(Some)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode symptoms: {err}")))
}

fn decode_symptoms(raw: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|_| {
        RepoError::InvalidData("cycles.symptoms is not a JSON array of strings".to_string())
    })
}

//! SQLite persistence for observed rides.
//!
//! A ride is inserted the first time it is seen and only its `last_seen`
//! and `absent_since` columns change afterwards. Absent rides stay in the
//! table as history until [`RideStore::prune`] removes them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use ridewatch_core::models::START_TIME_FORMAT;
use ridewatch_core::{ExamType, Slot, SlotId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, params_from_iter};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::StoreError;

const SELECT_COLUMNS: &str = "id, exam_type, location, location_id, starts_at, name, cost, raw, \
     first_seen, last_seen, absent_since";

// ============================================================================
// Query Types
// ============================================================================

/// Read filter for [`RideStore::query`].
#[derive(Debug, Clone, Default)]
pub struct RideQuery {
    /// Restrict to one examination type.
    pub exam_type: Option<ExamType>,
    /// Earliest start date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest start date, inclusive.
    pub to: Option<NaiveDate>,
    /// Location name (case-insensitive exact match).
    pub location: Option<String>,
    /// Include logically deleted rides.
    pub include_absent: bool,
}

impl RideQuery {
    /// Present rides of one examination type.
    pub fn for_exam(exam_type: ExamType) -> Self {
        Self {
            exam_type: Some(exam_type),
            ..Self::default()
        }
    }
}

/// Ride counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RideStats {
    /// Rides currently reported by the service.
    pub present: u64,
    /// Rides no longer reported.
    pub absent: u64,
}

// ============================================================================
// Ride Store
// ============================================================================

/// SQLite-based ride store.
pub struct RideStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for RideStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideStore").finish_non_exhaustive()
    }
}

impl RideStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        store.init_schema()?;
        info!(path = %path.display(), "Opened ride store");
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS rides (
                id TEXT PRIMARY KEY,
                exam_type TEXT NOT NULL,
                location TEXT NOT NULL,
                location_id INTEGER,
                starts_at TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                cost TEXT,
                raw TEXT NOT NULL DEFAULT 'null',
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                absent_since TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_rides_exam_start ON rides(exam_type, starts_at);
            CREATE INDEX IF NOT EXISTS idx_rides_location ON rides(location COLLATE NOCASE);
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Inserts unseen rides and refreshes `last_seen` of known ones.
    pub fn upsert(&self, slots: &[Slot]) -> Result<usize, StoreError> {
        self.upsert_at(slots, Utc::now())
    }

    /// [`upsert`](Self::upsert) with an explicit observation time.
    pub fn upsert_at(&self, slots: &[Slot], seen_at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let count = upsert_tx(&tx, slots, seen_at)?;
        tx.commit()?;
        Ok(count)
    }

    /// Marks rides as no longer reported.
    pub fn mark_absent(&self, ids: &[SlotId]) -> Result<usize, StoreError> {
        self.mark_absent_at(ids, Utc::now())
    }

    /// [`mark_absent`](Self::mark_absent) with an explicit time.
    pub fn mark_absent_at(&self, ids: &[SlotId], at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let count = mark_absent_tx(&tx, ids, at)?;
        tx.commit()?;
        Ok(count)
    }

    /// Applies one poll: upserts `fetched` and marks `removed` absent atomically.
    pub fn record_poll(&self, fetched: &[Slot], removed: &[SlotId]) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let upserted = upsert_tx(&tx, fetched, now)?;
        let absent = mark_absent_tx(&tx, removed, now)?;
        tx.commit()?;

        debug!(upserted, absent, "Recorded poll");
        Ok(())
    }

    /// Deletes absent rides whose absence is older than `older_than`.
    ///
    /// Present rides are never removed. A threshold reaching past the
    /// representable time range deletes nothing.
    pub fn prune(&self, older_than: chrono::Duration) -> Result<usize, StoreError> {
        let Some(cutoff) = Utc::now().checked_sub_signed(older_than) else {
            debug!(days = older_than.num_days(), "Prune threshold out of range, nothing to delete");
            return Ok(0);
        };
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM rides WHERE absent_since IS NOT NULL AND absent_since < ?1",
            params![format_ts(cutoff)],
        )?;

        info!(deleted, cutoff = %cutoff, "Pruned absent rides");
        Ok(deleted)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Returns rides matching `query`, ordered by start time.
    pub fn query(&self, query: &RideQuery) -> Result<Vec<Slot>, StoreError> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(exam) = query.exam_type {
            conditions.push("exam_type = ?");
            values.push(SqlValue::Text(exam.as_str().to_string()));
        }
        if let Some(from) = query.from {
            conditions.push("substr(starts_at, 1, 10) >= ?");
            values.push(SqlValue::Text(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = query.to {
            conditions.push("substr(starts_at, 1, 10) <= ?");
            values.push(SqlValue::Text(to.format("%Y-%m-%d").to_string()));
        }
        if let Some(location) = query.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            conditions.push("location = ? COLLATE NOCASE");
            values.push(SqlValue::Text(location.to_string()));
        }
        if !query.include_absent {
            conditions.push("absent_since IS NULL");
        }

        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM rides");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY starts_at ASC, location ASC");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rides = stmt
            .query_map(params_from_iter(values), row_to_slot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rides)
    }

    /// Present rides of one examination type.
    pub fn present(&self, exam_type: ExamType) -> Result<Vec<Slot>, StoreError> {
        self.query(&RideQuery::for_exam(exam_type))
    }

    /// Looks up one ride, present or absent.
    pub fn get(&self, id: &SlotId) -> Result<Option<Slot>, StoreError> {
        let conn = self.lock()?;
        let slot = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM rides WHERE id = ?1"),
                params![id.as_str()],
                row_to_slot,
            )
            .optional()?;
        Ok(slot)
    }

    /// Earliest present ride starting at or after `after`.
    pub fn next_available(
        &self,
        exam_type: ExamType,
        after: NaiveDateTime,
    ) -> Result<Option<Slot>, StoreError> {
        let conn = self.lock()?;
        let slot = conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM rides \
                     WHERE exam_type = ?1 AND absent_since IS NULL AND starts_at >= ?2 \
                     ORDER BY starts_at ASC LIMIT 1"
                ),
                params![exam_type.as_str(), after.format(START_TIME_FORMAT).to_string()],
                row_to_slot,
            )
            .optional()?;
        Ok(slot)
    }

    /// Present and absent counts, optionally for one examination type.
    pub fn stats(&self, exam_type: Option<ExamType>) -> Result<RideStats, StoreError> {
        let conn = self.lock()?;
        let (present, absent): (i64, i64) = conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN absent_since IS NULL THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN absent_since IS NOT NULL THEN 1 ELSE 0 END), 0)
             FROM rides WHERE ?1 IS NULL OR exam_type = ?1",
            params![exam_type.map(|e| e.as_str())],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(RideStats {
            present: u64::try_from(present).unwrap_or(0),
            absent: u64::try_from(absent).unwrap_or(0),
        })
    }
}

// ============================================================================
// Statement Helpers
// ============================================================================

fn upsert_tx(tx: &Transaction<'_>, slots: &[Slot], seen_at: DateTime<Utc>) -> Result<usize, StoreError> {
    let seen = format_ts(seen_at);
    let mut stmt = tx.prepare_cached(
        r"
        INSERT INTO rides (
            id, exam_type, location, location_id, starts_at, name, cost, raw,
            first_seen, last_seen, absent_since
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, NULL)
        ON CONFLICT(id) DO UPDATE SET
            last_seen = excluded.last_seen,
            absent_since = NULL
        ",
    )?;

    for slot in slots {
        stmt.execute(params![
            slot.id.as_str(),
            slot.exam_type.as_str(),
            slot.location,
            slot.location_id,
            slot.starts_at.format(START_TIME_FORMAT).to_string(),
            slot.name,
            slot.cost,
            serde_json::to_string(&slot.raw)?,
            seen,
        ])?;
    }
    Ok(slots.len())
}

fn mark_absent_tx(tx: &Transaction<'_>, ids: &[SlotId], at: DateTime<Utc>) -> Result<usize, StoreError> {
    let at = format_ts(at);
    let mut stmt = tx.prepare_cached(
        "UPDATE rides SET absent_since = ?1 WHERE id = ?2 AND absent_since IS NULL",
    )?;

    let mut count = 0;
    for id in ids {
        count += stmt.execute(params![at, id.as_str()])?;
    }
    Ok(count)
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_ts(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e))
}

fn row_to_slot(row: &Row<'_>) -> rusqlite::Result<Slot> {
    let exam: String = row.get(1)?;
    let exam_type = exam.parse::<ExamType>().map_err(|e| conversion_error(1, e))?;

    let starts_at: String = row.get(4)?;
    let starts_at = NaiveDateTime::parse_from_str(&starts_at, START_TIME_FORMAT)
        .map_err(|e| conversion_error(4, e))?;

    let raw: String = row.get(7)?;
    let raw = serde_json::from_str(&raw).map_err(|e| conversion_error(7, e))?;

    let first_seen: String = row.get(8)?;
    let last_seen: String = row.get(9)?;
    let absent_since: Option<String> = row.get(10)?;

    Ok(Slot {
        id: SlotId::from_raw(row.get::<_, String>(0)?),
        exam_type,
        location: row.get(2)?,
        location_id: row.get(3)?,
        starts_at,
        name: row.get(5)?,
        cost: row.get(6)?,
        raw,
        first_seen: parse_ts(8, &first_seen)?,
        last_seen: parse_ts(9, &last_seen)?,
        absent_since: absent_since.map(|s| parse_ts(10, &s)).transpose()?,
    })
}

// ============================================================================
// Tests
// ============================================================================

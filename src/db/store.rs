//! SQLite database store implementation.
//!
//! Status reports are append-only. Every insert also maintains the
//! `device_latest` pointer table inside the same transaction, so the
//! latest-per-device question is answered from the pointer table joined
//! back to the report log instead of a group-by over the full history.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::models::{StatusReport, StatusReportInput};

const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;

        Ok(())
    }

    // --- Write path ---

    /// Persist a validated status report and return it with `id` and
    /// `created_at` assigned.
    ///
    /// The report insert and the `device_latest` upsert commit in one
    /// transaction. The pointer moves only when the new report's
    /// `(timestamp, id)` exceeds the current latest's, so a late-arriving
    /// older report never displaces a newer one, and a timestamp tie is
    /// won by the higher id.
    pub fn record_status(&self, input: &StatusReportInput) -> Result<StatusReport, DbError> {
        let created_at = Utc::now();
        let timestamp_str = input.timestamp.format(DB_TIME_FORMAT).to_string();

        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO status_reports (device_id, timestamp, battery_level, rssi, online, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.device_id,
                timestamp_str,
                input.battery_level,
                input.rssi,
                input.online,
                created_at.format(DB_TIME_FORMAT).to_string(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        let current: Option<(String, i64)> = tx
            .query_row(
                "SELECT s.timestamp, s.id FROM device_latest dl
                 JOIN status_reports s ON s.id = dl.report_id
                 WHERE dl.device_id = ?1",
                params![input.device_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match current {
            None => {
                tx.execute(
                    "INSERT INTO device_latest (device_id, report_id) VALUES (?1, ?2)",
                    params![input.device_id, id],
                )?;
            }
            Some((cur_ts, cur_id)) => {
                // DB_TIME_FORMAT is fixed-width, so string order is time order.
                if (timestamp_str.as_str(), id) > (cur_ts.as_str(), cur_id) {
                    tx.execute(
                        "UPDATE device_latest SET report_id = ?1 WHERE device_id = ?2",
                        params![id, input.device_id],
                    )?;
                }
            }
        }

        tx.commit()?;

        Ok(StatusReport {
            id,
            device_id: input.device_id.clone(),
            timestamp: input.timestamp,
            battery_level: input.battery_level,
            rssi: input.rssi,
            online: input.online,
            created_at,
        })
    }

    // --- Latest-status reads (served from the pointer table) ---

    /// Latest report for every device that has ever reported, ordered by
    /// device id.
    pub fn latest_statuses(&self) -> Result<Vec<StatusReport>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.device_id, s.timestamp, s.battery_level, s.rssi, s.online, s.created_at
             FROM device_latest dl
             JOIN status_reports s ON s.id = dl.report_id
             ORDER BY dl.device_id ASC",
        )?;

        let reports = stmt
            .query_map([], report_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(reports)
    }

    /// Latest report for a single device, if it has ever reported.
    pub fn latest_for_device(&self, device_id: &str) -> Result<Option<StatusReport>, DbError> {
        let conn = self.conn.lock().unwrap();
        let report = conn
            .query_row(
                "SELECT s.id, s.device_id, s.timestamp, s.battery_level, s.rssi, s.online, s.created_at
                 FROM device_latest dl
                 JOIN status_reports s ON s.id = dl.report_id
                 WHERE dl.device_id = ?1",
                params![device_id],
                report_from_row,
            )
            .optional()?;
        Ok(report)
    }

    // --- History reads ---

    /// Total number of reports ever recorded for a device.
    pub fn count_for_device(&self, device_id: &str) -> Result<i64, DbError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM status_reports WHERE device_id = ?1",
            params![device_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// A slice of a device's history in descending `(timestamp, id)` order.
    pub fn history_slice(
        &self,
        device_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StatusReport>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, device_id, timestamp, battery_level, rssi, online, created_at
             FROM status_reports
             WHERE device_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )?;

        let reports = stmt
            .query_map(params![device_id, limit, offset], report_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(reports)
    }
}

fn report_from_row(row: &Row<'_>) -> SqlResult<StatusReport> {
    let timestamp_str: String = row.get(2)?;
    let created_str: String = row.get(6)?;
    Ok(StatusReport {
        id: row.get(0)?,
        device_id: row.get(1)?,
        timestamp: parse_db_time(&timestamp_str).unwrap_or_else(Utc::now),
        battery_level: row.get(3)?,
        rssi: row.get(4)?,
        online: row.get(5)?,
        created_at: parse_db_time(&created_str).unwrap_or_else(Utc::now),
    })
}

/// Parse a datetime string from the database.
fn parse_db_time(s: &str) -> Option<DateTime<Utc>> {
    let formats = [DB_TIME_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    fn input(device_id: &str, timestamp: DateTime<Utc>, battery_level: i64) -> StatusReportInput {
        StatusReportInput {
            device_id: device_id.to_string(),
            timestamp,
            battery_level,
            rssi: -60,
            online: true,
        }
    }

    #[test]
    fn test_record_assigns_id_and_created_at() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        let report = store.record_status(&input("sensor-1", Utc::now(), 80)).unwrap();
        assert!(report.id > 0);
        assert_eq!(report.device_id, "sensor-1");
        assert_eq!(report.battery_level, 80);
    }

    #[test]
    fn test_latest_tracks_newest_timestamp() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        let now = Utc::now();

        store.record_status(&input("sensor-1", now - Duration::minutes(10), 90)).unwrap();
        let newest = store.record_status(&input("sensor-1", now, 70)).unwrap();

        let latest = store.latest_for_device("sensor-1").unwrap().unwrap();
        assert_eq!(latest.id, newest.id);
        assert_eq!(latest.battery_level, 70);
    }

    #[test]
    fn test_out_of_order_write_does_not_displace_latest() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        let now = Utc::now();

        let newest = store.record_status(&input("sensor-1", now, 70)).unwrap();
        store.record_status(&input("sensor-1", now - Duration::hours(1), 95)).unwrap();

        let latest = store.latest_for_device("sensor-1").unwrap().unwrap();
        assert_eq!(latest.id, newest.id);
    }

    #[test]
    fn test_timestamp_tie_broken_by_id() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        let ts = Utc::now();

        store.record_status(&input("sensor-1", ts, 50)).unwrap();
        let second = store.record_status(&input("sensor-1", ts, 60)).unwrap();

        let latest = store.latest_for_device("sensor-1").unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.battery_level, 60);
    }

    #[test]
    fn test_latest_statuses_one_entry_per_device() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        let now = Utc::now();

        store.record_status(&input("sensor-b", now, 60)).unwrap();
        store.record_status(&input("sensor-a", now - Duration::minutes(5), 80)).unwrap();
        store.record_status(&input("sensor-a", now, 75)).unwrap();

        let latest = store.latest_statuses().unwrap();
        assert_eq!(latest.len(), 2);
        // Ordered by device id.
        assert_eq!(latest[0].device_id, "sensor-a");
        assert_eq!(latest[0].battery_level, 75);
        assert_eq!(latest[1].device_id, "sensor-b");
    }

    #[test]
    fn test_latest_for_unknown_device_is_none() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        assert!(store.latest_for_device("ghost").unwrap().is_none());
    }

    #[test]
    fn test_history_slice_descending_with_count() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        let now = Utc::now();

        for i in 0..5 {
            store
                .record_status(&input("sensor-1", now - Duration::minutes(i), 50))
                .unwrap();
        }

        assert_eq!(store.count_for_device("sensor-1").unwrap(), 5);

        let slice = store.history_slice("sensor-1", 3, 0).unwrap();
        assert_eq!(slice.len(), 3);
        assert!(slice[0].timestamp > slice[1].timestamp);
        assert!(slice[1].timestamp > slice[2].timestamp);

        let rest = store.history_slice("sensor-1", 3, 3).unwrap();
        assert_eq!(rest.len(), 2);
    }
}

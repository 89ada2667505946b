//! SQLite-backed notification store — survives restarts, single table.
//!
//! Timestamps are stored as RFC 3339 UTC text, so `ORDER BY scheduled_time`
//! is chronological. Every operation takes the connection mutex for the
//! duration of one statement; nothing holds it across an await point.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use herald_core::error::{HeraldError, Result};

use crate::notification::Notification;

/// Durable store for pending notifications.
pub struct NotificationStore {
    conn: Mutex<Connection>,
}

impl NotificationStore {
    /// Open or create the store at `path`, migrating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| HeraldError::Storage(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HeraldError::Storage(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                channel_id INTEGER NOT NULL,
                scheduled_time TEXT NOT NULL,
                message TEXT NOT NULL,
                owner_id INTEGER NOT NULL
            );",
        )
        .map_err(|e| HeraldError::Storage(format!("Migration: {e}")))?;
        Ok(())
    }

    /// Insert a new record and return its assigned id.
    pub fn create(
        &self,
        channel_id: i64,
        scheduled_time: DateTime<Utc>,
        message: &str,
        owner_id: i64,
    ) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notifications (channel_id, scheduled_time, message, owner_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                channel_id,
                scheduled_time.to_rfc3339(),
                message,
                owner_id
            ],
        )
        .map_err(|e| HeraldError::Storage(format!("Insert: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    /// Full snapshot, ascending by scheduled_time.
    pub fn list_all(&self) -> Result<Vec<Notification>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, channel_id, scheduled_time, message, owner_id
                 FROM notifications ORDER BY scheduled_time",
            )
            .map_err(|e| HeraldError::Storage(format!("Query: {e}")))?;
        let rows = stmt
            .query_map([], row_to_notification)
            .map_err(|e| HeraldError::Storage(format!("Query: {e}")))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| HeraldError::Storage(format!("Row: {e}")))
    }

    /// Fetch a single record.
    pub fn get(&self, id: i64) -> Result<Option<Notification>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, channel_id, scheduled_time, message, owner_id
                 FROM notifications WHERE id = ?1",
            )
            .map_err(|e| HeraldError::Storage(format!("Query: {e}")))?;
        match stmt.query_row(rusqlite::params![id], row_to_notification) {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(HeraldError::Storage(format!("Query: {e}"))),
        }
    }

    /// Delete a record. Returns true iff a row was removed; deleting an
    /// absent id is a no-op.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM notifications WHERE id = ?1", rusqlite::params![id])
            .map_err(|e| HeraldError::Storage(format!("Delete: {e}")))?;
        Ok(removed > 0)
    }

    /// Number of pending records.
    pub fn pending_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM notifications", [], |r| {
            r.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|e| HeraldError::Storage(format!("Count: {e}")))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HeraldError::Storage(format!("Lock poisoned: {e}")))
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let raw: String = row.get(2)?;
    let scheduled_time = DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(Notification {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        scheduled_time,
        message: row.get(3)?,
        owner_id: row.get(4)?,
    })
}

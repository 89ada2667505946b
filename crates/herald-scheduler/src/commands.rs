//! Command-facing API — the narrow surface the UI layer calls into the
//! store: schedule, list, cancel. Policy lives here (future-time check,
//! ownership), not in the store.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use herald_core::error::HeraldError;

use crate::notification::Notification;
use crate::store::NotificationStore;

/// Accepted schedule time format, always interpreted as UTC.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// User-facing failures of the command surface. These are replies, not
/// system faults; only `Storage` indicates something actually broke.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid time format: {0:?}. Please use YYYY-mm-dd HH:MM (UTC).")]
    InvalidTime(String),

    #[error("Scheduled time must be in the future.")]
    TimeInPast,

    #[error("No notification found with ID {0}.")]
    NotFound(i64),

    #[error("You can only cancel your own notifications unless you're an admin.")]
    Forbidden,

    #[error(transparent)]
    Storage(#[from] HeraldError),
}

/// Scheduling operations over the shared store.
pub struct Commands {
    store: Arc<NotificationStore>,
}

impl Commands {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self { store }
    }

    /// Schedule a notification from a user-supplied time string.
    pub fn schedule(
        &self,
        channel_id: i64,
        time_str: &str,
        message: &str,
        owner_id: i64,
    ) -> Result<i64, CommandError> {
        let scheduled_time = parse_time(time_str)?;
        self.schedule_at(channel_id, scheduled_time, message, owner_id)
    }

    /// Schedule a notification at an already-parsed instant. Rejects any
    /// time not strictly in the future.
    pub fn schedule_at(
        &self,
        channel_id: i64,
        scheduled_time: DateTime<Utc>,
        message: &str,
        owner_id: i64,
    ) -> Result<i64, CommandError> {
        if scheduled_time <= Utc::now() {
            return Err(CommandError::TimeInPast);
        }

        let id = self
            .store
            .create(channel_id, scheduled_time, message, owner_id)?;
        tracing::info!(
            "User {owner_id} scheduled notification {id} for {scheduled_time} in channel {channel_id}"
        );
        Ok(id)
    }

    /// All pending notifications, ascending by scheduled time.
    pub fn list(&self) -> Result<Vec<Notification>, CommandError> {
        Ok(self.store.list_all()?)
    }

    /// Cancel a notification. Only its owner may cancel it, unless the
    /// requester is an admin. Returns the removed record.
    pub fn cancel(
        &self,
        id: i64,
        requester_id: i64,
        requester_is_admin: bool,
    ) -> Result<Notification, CommandError> {
        let record = self.store.get(id)?.ok_or(CommandError::NotFound(id))?;

        if record.owner_id != requester_id && !requester_is_admin {
            return Err(CommandError::Forbidden);
        }

        // A tick may have delivered and deleted the record between the get
        // and this delete; the record is truly gone either way.
        if !self.store.delete(id)? {
            return Err(CommandError::NotFound(id));
        }
        tracing::info!("User {requester_id} canceled notification {id}");
        Ok(record)
    }
}

fn parse_time(time_str: &str) -> Result<DateTime<Utc>, CommandError> {
    NaiveDateTime::parse_from_str(time_str.trim(), TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| CommandError::InvalidTime(time_str.to_string()))
}

//! Notification record — the core data model for scheduled delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending scheduled notification.
///
/// Lives in the store from creation until either an explicit cancel or the
/// scheduler processing it as due. There is no update operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Store-assigned id, monotonically increasing, never reused.
    pub id: i64,
    /// Delivery target. Not validated against live channels at creation.
    pub channel_id: i64,
    /// Earliest instant delivery should occur (UTC).
    pub scheduled_time: DateTime<Utc>,
    /// Opaque payload; may contain platform markup such as mentions.
    pub message: String,
    /// Creating principal. Only the cancel path reads this.
    pub owner_id: i64,
}

impl Notification {
    /// Whether this record is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time <= now
    }

    /// Message truncated to 100 chars for listings and logs.
    pub fn preview(&self) -> String {
        if self.message.chars().count() <= 100 {
            self.message.clone()
        } else {
            let head: String = self.message.chars().take(97).collect();
            format!("{head}...")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(at: DateTime<Utc>) -> Notification {
        Notification {
            id: 1,
            channel_id: 42,
            scheduled_time: at,
            message: "hello".into(),
            owner_id: 7,
        }
    }

    #[test]
    fn test_due_check() {
        let now = Utc::now();
        assert!(sample(now - Duration::seconds(1)).is_due(now));
        assert!(sample(now).is_due(now));
        assert!(!sample(now + Duration::seconds(1)).is_due(now));
    }

    #[test]
    fn test_preview_truncates() {
        let mut n = sample(Utc::now());
        n.message = "x".repeat(250);
        let preview = n.preview();
        assert_eq!(preview.chars().count(), 100);
        assert!(preview.ends_with("..."));

        n.message = "short".into();
        assert_eq!(n.preview(), "short");
    }
}

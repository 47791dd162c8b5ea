use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::de;

/// A persisted row of the `notifications` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredNotification {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Overdue,
    #[serde(rename = "Due Soon")]
    DueSoon,
    #[serde(rename = "Plan Changed")]
    PlanChanged,
    Notification,
}

/// An inbox entry. Renewal alerts reuse the subscription id, which is what
/// de-duplication keys on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub date: NaiveDate,
    pub read: bool,
}

impl Notification {
    pub fn from_stored(row: &StoredNotification, today: NaiveDate) -> Self {
        Self {
            id: format!("stored-{}", row.id),
            kind: NotificationKind::Notification,
            message: row.message.clone(),
            date: row.created_at.map(|at| at.date_naive()).unwrap_or(today),
            read: false,
        }
    }
}

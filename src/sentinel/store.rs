use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::domain::lead::{LeadId, WatchedLead};
use crate::domain::notification::{NewNotification, Notification};
use crate::sentinel::retry::Retryable;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer holds the record; safe to retry.
    #[error("write conflict: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// The columns a scan owns on a lead record. Nothing else is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanWrite {
    pub business_data: Value,
    pub last_scanned: DateTime<Utc>,
}

/// Snapshot store consumed by the sentinel.
pub trait LeadStore: Send + Sync {
    /// Watched leads, stalest first, at most `limit` of them.
    fn find_watched(&self, limit: usize) -> Result<Vec<WatchedLead>, StoreError>;

    fn update_scan(&self, id: LeadId, write: &ScanWrite) -> Result<(), StoreError>;
}

/// Append-only destination for notifications.
pub trait NotificationSink: Send + Sync {
    fn create(&self, notification: &NewNotification) -> Result<Notification, StoreError>;
}

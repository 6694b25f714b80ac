// SQLite-backed collaborators for the sentinel.
use crate::db::connection::Database;
use crate::db::leads::{find_lead, find_watched_leads, insert_lead, update_lead_scan, LeadRecord};
use crate::db::notifications::insert_notification;
use crate::domain::lead::{LeadId, NewLead, WatchedLead};
use crate::domain::notification::{NewNotification, Notification};
use crate::errors::ServerError;
use crate::sentinel::{LeadStore, NotificationSink, ScanWrite, StoreError};
use chrono::Utc;

#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a lead and returns the stored record.
    pub fn create_lead(&self, lead: &NewLead) -> Result<LeadRecord, ServerError> {
        self.db.with_conn(|conn| {
            let id = insert_lead(conn, lead, Utc::now())?;
            find_lead(conn, id)?.ok_or(ServerError::InternalError)
        })
    }
}

impl From<ServerError> for StoreError {
    fn from(e: ServerError) -> Self {
        match e {
            ServerError::Conflict(msg) => StoreError::Conflict(msg),
            ServerError::ResourceNotFound(msg) => StoreError::NotFound(msg),
            ServerError::NotFound => StoreError::NotFound("lead".into()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl LeadStore for SqliteStore {
    fn find_watched(&self, limit: usize) -> Result<Vec<WatchedLead>, StoreError> {
        self.db
            .with_conn(|conn| find_watched_leads(conn, limit))
            .map_err(StoreError::from)
    }

    fn update_scan(&self, id: LeadId, write: &ScanWrite) -> Result<(), StoreError> {
        self.db
            .with_conn(|conn| update_lead_scan(conn, id, &write.business_data, write.last_scanned))
            .map_err(StoreError::from)
    }
}

impl NotificationSink for SqliteStore {
    fn create(&self, notification: &NewNotification) -> Result<Notification, StoreError> {
        self.db
            .with_conn(|conn| insert_notification(conn, notification, Utc::now()))
            .map_err(StoreError::from)
    }
}

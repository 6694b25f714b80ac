// src/domain/notification.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::changes::{ChangeEvent, ChangeKind, ChangeValue};
use crate::domain::lead::{LeadId, UserId, WatchedLead};

/// A notification about to be written to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user: UserId,
    pub lead: LeadId,
    pub kind: ChangeKind,
    pub message: String,
    pub details: Value,
}

/// A persisted notification. Only `is_read` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user: UserId,
    pub lead: LeadId,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub details: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    /// Builds the notification for one detected change on `lead`.
    pub fn for_change(lead: &WatchedLead, event: &ChangeEvent) -> Self {
        NewNotification {
            user: lead.owner,
            lead: lead.id,
            kind: event.kind,
            message: compose_message(&lead.business_name, event),
            details: serde_json::json!({
                "from": event.from,
                "to": event.to,
            }),
        }
    }
}

/// Human-readable summary: the business name plus the new state.
pub fn compose_message(business_name: &str, event: &ChangeEvent) -> String {
    match (event.kind, &event.to) {
        (ChangeKind::Accessibility, ChangeValue::Flag(true)) => {
            format!("{business_name}'s website is now accessible.")
        }
        (ChangeKind::Accessibility, _) => {
            format!("{business_name}'s website is now inaccessible.")
        }
        (ChangeKind::Certificate, ChangeValue::Flag(true)) => {
            format!("{business_name}'s website now has a valid SSL certificate.")
        }
        (ChangeKind::Certificate, _) => {
            format!("{business_name}'s website no longer has a valid SSL certificate.")
        }
        (ChangeKind::Performance, to) => format!(
            "{business_name}'s performance score dropped from {} to {}.",
            describe(&event.from),
            describe(to)
        ),
        (ChangeKind::Technology, to) => format!(
            "{business_name}'s website technology changed (now: {}).",
            describe(to)
        ),
    }
}

fn describe(value: &ChangeValue) -> String {
    match value {
        ChangeValue::Flag(b) => b.to_string(),
        ChangeValue::Score(n) => n.to_string(),
        ChangeValue::Stack(names) if names.is_empty() => "none detected".to_string(),
        ChangeValue::Stack(names) => names.join(", "),
    }
}

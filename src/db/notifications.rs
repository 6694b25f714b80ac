// src/db/notifications.rs
use crate::domain::lead::UserId;
use crate::domain::notification::{NewNotification, Notification};
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, lead_id, type, message, details, is_read, created_at";

pub fn insert_notification(
    conn: &Connection,
    n: &NewNotification,
    now: DateTime<Utc>,
) -> Result<Notification, ServerError> {
    conn.execute(
        r#"
        INSERT INTO notifications (user_id, lead_id, type, message, details, is_read, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
        "#,
        params![
            n.user,
            n.lead,
            n.kind.type_tag(),
            &n.message,
            n.details.to_string(),
            now,
        ],
    )?;

    Ok(Notification {
        id: conn.last_insert_rowid(),
        user: n.user,
        lead: n.lead,
        kind: n.kind.type_tag().to_string(),
        message: n.message.clone(),
        details: n.details.clone(),
        is_read: false,
        created_at: now,
    })
}

/// Newest first, at most `limit`.
pub fn list_notifications(
    conn: &Connection,
    user: UserId,
    unread_only: bool,
    limit: usize,
) -> Result<Vec<Notification>, ServerError> {
    let sql = format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS}
        FROM notifications
        WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
        ORDER BY created_at DESC, id DESC
        LIMIT ?3
        "#
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![user, unread_only, limit as i64],
        notification_from_row,
    )?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Returns the updated notification, or `None` when it does not exist.
pub fn set_notification_read(
    conn: &Connection,
    id: i64,
    is_read: bool,
) -> Result<Option<Notification>, ServerError> {
    let updated = conn.execute(
        "UPDATE notifications SET is_read = ?1 WHERE id = ?2",
        params![is_read, id],
    )?;
    if updated == 0 {
        return Ok(None);
    }

    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1");
    let n = conn
        .query_row(&sql, params![id], notification_from_row)
        .optional()?;
    Ok(n)
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let details: String = row.get(5)?;
    Ok(Notification {
        id: row.get(0)?,
        user: row.get(1)?,
        lead: row.get(2)?,
        kind: row.get(3)?,
        message: row.get(4)?,
        details: serde_json::from_str(&details).unwrap_or(Value::Null),
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

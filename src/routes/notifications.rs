use crate::app::AppState;
use crate::db::notifications::{list_notifications, set_notification_read};
use crate::errors::{ResultResp, ServerError};
use crate::responses::json_ok;
use serde::Deserialize;
use std::collections::HashMap;

const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRead {
    pub is_read: Option<bool>,
}

/// `?userId=..&unread=true`
pub fn list(query: &HashMap<String, String>, state: &AppState) -> ResultResp {
    let user = query
        .get("userId")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest("User ID is required".into()))?;
    let user: i64 = user
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("Invalid user ID: {user}")))?;
    let unread_only = query.get("unread").map(String::as_str) == Some("true");

    let notifications = state
        .db
        .with_conn(|conn| list_notifications(conn, user, unread_only, PAGE_SIZE))?;
    json_ok(&notifications)
}

pub fn mark_read(id: i64, body: MarkRead, state: &AppState) -> ResultResp {
    let is_read = body
        .is_read
        .ok_or_else(|| ServerError::BadRequest("isRead is required".into()))?;

    let updated = state
        .db
        .with_conn(|conn| set_notification_read(conn, id, is_read))?
        .ok_or_else(|| ServerError::ResourceNotFound("Notification not found".into()))?;
    json_ok(&updated)
}

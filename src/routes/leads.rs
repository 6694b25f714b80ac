use crate::app::AppState;
use crate::db::leads::{apply_lead_edit, list_leads, LeadEdit};
use crate::domain::lead::{LeadStatus, NewLead};
use crate::errors::{ResultResp, ServerError};
use crate::responses::{json_ok, json_response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeadBody {
    pub user_id: Option<i64>,
    pub business_name: Option<String>,
    pub place_id: Option<String>,
    #[serde(default)]
    pub business_data: Option<Value>,
    #[serde(default)]
    pub is_watched: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadEditBody {
    pub status: Option<String>,
    pub notes: Option<String>,
    pub is_watched: Option<bool>,
}

/// Saves a business found by search as a lead. `businessData` is the
/// baseline snapshot the first scan is compared against.
pub fn create(body: NewLeadBody, state: &AppState) -> ResultResp {
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let (Some(owner), Some(business_name), Some(place_id)) = (
        body.user_id,
        non_empty(body.business_name),
        non_empty(body.place_id),
    ) else {
        return Err(ServerError::BadRequest(
            "userId, businessName and placeId are required".into(),
        ));
    };

    let new_lead = NewLead {
        owner,
        business_name,
        place_id,
        business_data: body
            .business_data
            .unwrap_or_else(|| Value::Object(Default::default())),
        is_watched: body.is_watched,
    };

    let lead = state.store.create_lead(&new_lead).map_err(|e| match e {
        ServerError::AlreadyExists(_) => ServerError::AlreadyExists(format!(
            "A lead for place {} already exists",
            new_lead.place_id
        )),
        other => other,
    })?;
    tracing::info!(lead = lead.id, owner, "lead created");
    json_response(201, &lead)
}

/// `?userId=..`
pub fn list(query: &HashMap<String, String>, state: &AppState) -> ResultResp {
    let user = query
        .get("userId")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest("User ID is required".into()))?;
    let user: i64 = user
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("Invalid user ID: {user}")))?;

    let leads = state.db.with_conn(|conn| list_leads(conn, user, PAGE_SIZE))?;
    json_ok(&leads)
}

/// User edit of CRM fields. Competes with the sentinel for the same row but
/// never writes the columns a scan owns.
pub fn edit(id: i64, body: LeadEditBody, state: &AppState) -> ResultResp {
    let status = match body.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            LeadStatus::parse(raw)
                .ok_or_else(|| ServerError::BadRequest(format!("Unknown status: {raw}")))?,
        ),
        None => None,
    };

    let edit = LeadEdit {
        status,
        notes: body.notes.filter(|n| !n.is_empty()),
        is_watched: body.is_watched,
    };
    if edit.is_empty() {
        return Err(ServerError::BadRequest(
            "Status, notes, or isWatched is required".into(),
        ));
    }

    let lead = state
        .db
        .with_conn(|conn| apply_lead_edit(conn, id, &edit, Utc::now()))?
        .ok_or_else(|| ServerError::ResourceNotFound("Lead not found".into()))?;
    json_ok(&lead)
}

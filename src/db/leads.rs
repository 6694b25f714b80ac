// src/db/leads.rs
use crate::domain::lead::{LeadId, LeadStatus, NewLead, UserId, WatchedLead};
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;

/// Full lead row as returned to the CRM layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub id: LeadId,
    pub owner: UserId,
    pub business_name: String,
    pub place_id: String,
    pub status: String,
    pub notes: Option<String>,
    pub contacted_date: Option<DateTime<Utc>>,
    pub is_watched: bool,
    pub business_data: Value,
    pub last_scanned: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A user edit to the CRM fields. `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct LeadEdit {
    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
    pub is_watched: Option<bool>,
}

impl LeadEdit {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.is_watched.is_none()
    }
}

/// Stored JSON that fails to parse reads as `null`, i.e. "no website".
fn parse_business_data(id: LeadId, raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::debug!(lead = id, "unreadable business data: {e}");
        Value::Null
    })
}

pub fn insert_lead(conn: &Connection, lead: &NewLead, now: DateTime<Utc>) -> Result<LeadId, ServerError> {
    conn.execute(
        r#"
        INSERT INTO leads (owner_id, business_name, place_id, business_data, is_watched, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            lead.owner,
            &lead.business_name,
            &lead.place_id,
            lead.business_data.to_string(),
            lead.is_watched,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Watched leads, never-scanned first, then oldest scan first.
pub fn find_watched_leads(conn: &Connection, limit: usize) -> Result<Vec<WatchedLead>, ServerError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, owner_id, business_name, is_watched, business_data, last_scanned
        FROM leads
        WHERE is_watched = 1
        ORDER BY last_scanned IS NOT NULL, last_scanned, id
        LIMIT ?1
        "#,
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        let id: LeadId = row.get(0)?;
        let raw: String = row.get(4)?;
        Ok(WatchedLead {
            id,
            owner: row.get(1)?,
            business_name: row.get(2)?,
            is_watched: row.get(3)?,
            business_data: parse_business_data(id, &raw),
            last_scanned: row.get(5)?,
        })
    })?;

    let mut leads = Vec::new();
    for row in rows {
        leads.push(row?);
    }
    Ok(leads)
}

/// Writes the scan-owned columns of a lead. CRM fields are left untouched.
pub fn update_lead_scan(
    conn: &Connection,
    id: LeadId,
    business_data: &Value,
    last_scanned: DateTime<Utc>,
) -> Result<(), ServerError> {
    let updated = conn.execute(
        "UPDATE leads SET business_data = ?1, last_scanned = ?2 WHERE id = ?3",
        params![business_data.to_string(), last_scanned, id],
    )?;
    if updated == 0 {
        return Err(ServerError::ResourceNotFound(format!("Lead {id} not found")));
    }
    Ok(())
}

pub fn find_lead(conn: &Connection, id: LeadId) -> Result<Option<LeadRecord>, ServerError> {
    let lead = conn
        .query_row(
            r#"
            SELECT id, owner_id, business_name, place_id, status, notes, contacted_date,
                   is_watched, business_data, last_scanned, created_at
            FROM leads
            WHERE id = ?1
            "#,
            params![id],
            lead_record_from_row,
        )
        .optional()?;
    Ok(lead)
}

/// A user's leads, newest first.
pub fn list_leads(conn: &Connection, owner: UserId, limit: usize) -> Result<Vec<LeadRecord>, ServerError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, owner_id, business_name, place_id, status, notes, contacted_date,
               is_watched, business_data, last_scanned, created_at
        FROM leads
        WHERE owner_id = ?1
        ORDER BY created_at DESC, id DESC
        LIMIT ?2
        "#,
    )?;
    let rows = stmt.query_map(params![owner, limit as i64], lead_record_from_row)?;

    let mut leads = Vec::new();
    for row in rows {
        leads.push(row?);
    }
    Ok(leads)
}

/// Applies a user edit and returns the updated lead, or `None` if it does not exist.
/// Moving to `contacted` stamps the contacted date.
pub fn apply_lead_edit(
    conn: &mut Connection,
    id: LeadId,
    edit: &LeadEdit,
    now: DateTime<Utc>,
) -> Result<Option<LeadRecord>, ServerError> {
    let tx = conn.transaction()?;

    if let Some(status) = edit.status {
        let contacted = (status == LeadStatus::Contacted).then_some(now);
        tx.execute(
            "UPDATE leads SET status = ?1, contacted_date = COALESCE(?2, contacted_date) WHERE id = ?3",
            params![status.as_str(), contacted, id],
        )?;
    }
    if let Some(notes) = &edit.notes {
        tx.execute("UPDATE leads SET notes = ?1 WHERE id = ?2", params![notes, id])?;
    }
    if let Some(is_watched) = edit.is_watched {
        tx.execute(
            "UPDATE leads SET is_watched = ?1 WHERE id = ?2",
            params![is_watched, id],
        )?;
    }

    let lead = find_lead(&tx, id)?;
    tx.commit()?;
    Ok(lead)
}

fn lead_record_from_row(row: &Row<'_>) -> rusqlite::Result<LeadRecord> {
    let id: LeadId = row.get(0)?;
    let raw: String = row.get(8)?;
    Ok(LeadRecord {
        id,
        owner: row.get(1)?,
        business_name: row.get(2)?,
        place_id: row.get(3)?,
        status: row.get(4)?,
        notes: row.get(5)?,
        contacted_date: row.get(6)?,
        is_watched: row.get(7)?,
        business_data: parse_business_data(id, &raw),
        last_scanned: row.get(9)?,
        created_at: row.get(10)?,
    })
}

// src/domain/lead.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::snapshot::Snapshot;

pub type LeadId = i64;
pub type UserId = i64;

/// Placeholder the search layer writes when a business has no website.
pub const NO_WEBSITE_SENTINEL: &str = "N/A";

/// A lead as the sentinel sees it: identity, ownership, and the last
/// persisted business data snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedLead {
    pub id: LeadId,
    pub owner: UserId,
    pub business_name: String,
    pub is_watched: bool,
    pub business_data: Value,
    pub last_scanned: Option<DateTime<Utc>>,
}

impl WatchedLead {
    /// The website to probe, if the snapshot holds a usable one.
    /// Absent, blank, non-string and sentinel values all mean "no website".
    pub fn website(&self) -> Option<&str> {
        self.business_data
            .get("website")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|w| !w.is_empty() && *w != NO_WEBSITE_SENTINEL)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_business_data(&self.business_data)
    }
}

/// Data needed to create a lead record.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub owner: UserId,
    pub business_name: String,
    pub place_id: String,
    pub business_data: Value,
    pub is_watched: bool,
}

/// CRM pipeline stage. Owned by the user, never written by the scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Discussion,
    Proposal,
    Won,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Discussion => "discussion",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "discussion" => Some(LeadStatus::Discussion),
            "proposal" => Some(LeadStatus::Proposal),
            "won" => Some(LeadStatus::Won),
            "lost" => Some(LeadStatus::Lost),
            _ => None,
        }
    }
}

// src/domain/snapshot.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// businessData
//  ├── website                  (url | "N/A" | absent)
//  ├── website_status
//  │    ├── accessible
//  │    ├── status_code
//  │    ├── ssl_certificate
//  │    └── ...
//  ├── website_quality
//  │    ├── performance_score
//  │    └── issues
//  ├── technologies             [name, ...]
//  ├── analyzed_at
//  └── ...                      (search data, left untouched)

/// Result of probing a website once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub website_status: WebsiteStatus,
    pub website_quality: Option<WebsiteQuality>,
    /// `None` when no page was read, so nothing is known about the stack.
    #[serde(default)]
    pub technologies: Option<Vec<String>>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WebsiteStatus {
    pub accessible: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    /// Milliseconds until the response body was read.
    pub load_time: Option<u64>,
    pub ssl_certificate: Option<bool>,
    pub mobile_friendly: Option<bool>,
    pub has_contact_form: Option<bool>,
    pub has_email: Option<bool>,
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteQuality {
    pub performance_score: i64,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Typed view over the fields the sentinel tracks.
///
/// Every field is `None` when the stored data lacks it or holds something of
/// the wrong shape, so reading a snapshot never fails.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub accessible: Option<bool>,
    pub ssl_certificate: Option<bool>,
    pub performance_score: Option<i64>,
    /// Sorted and de-duplicated, so comparison is set equality.
    pub technologies: Option<Vec<String>>,
}

impl Snapshot {
    pub fn from_business_data(data: &Value) -> Self {
        let status = data.get("website_status");
        let quality = data.get("website_quality");

        Snapshot {
            accessible: status.and_then(|s| s.get("accessible")).and_then(Value::as_bool),
            ssl_certificate: status
                .and_then(|s| s.get("ssl_certificate"))
                .and_then(Value::as_bool),
            performance_score: quality
                .and_then(|q| q.get("performance_score"))
                .and_then(as_score),
            technologies: data
                .get("technologies")
                .and_then(Value::as_array)
                .map(|arr| {
                    normalize_technologies(arr.iter().filter_map(Value::as_str).map(String::from))
                }),
        }
    }
}

impl From<&AnalysisReport> for Snapshot {
    fn from(report: &AnalysisReport) -> Self {
        Snapshot {
            accessible: Some(report.website_status.accessible),
            ssl_certificate: report.website_status.ssl_certificate,
            performance_score: report.website_quality.as_ref().map(|q| q.performance_score),
            technologies: report
                .technologies
                .as_ref()
                .map(|names| normalize_technologies(names.iter().cloned())),
        }
    }
}

fn as_score(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64))
}

pub fn normalize_technologies(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Overlays a fresh report onto the stored business data.
///
/// Only the analyzer-owned keys are replaced; search data such as the
/// website, phone or rating is carried over. A stored value that is not an
/// object is treated as empty. Technologies the probe could not read keep
/// their last known value.
pub fn merge_business_data(old: &Value, report: &AnalysisReport) -> Value {
    let mut merged: Map<String, Value> = match old {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    let mut overlay = vec![
        ("website_status", serde_json::to_value(&report.website_status)),
        ("website_quality", serde_json::to_value(&report.website_quality)),
        ("analyzed_at", serde_json::to_value(report.analyzed_at)),
    ];
    if let Some(technologies) = &report.technologies {
        overlay.push(("technologies", serde_json::to_value(technologies)));
    }

    for (key, value) in overlay {
        // These are plain structs; serialization cannot fail in practice.
        merged.insert(key.to_string(), value.unwrap_or(Value::Null));
    }

    Value::Object(merged)
}

use crate::db::connection::{init_db, Database};
use crate::db::leads::insert_lead;
use crate::domain::lead::{LeadId, NewLead};
use crate::domain::snapshot::{AnalysisReport, WebsiteQuality, WebsiteStatus};
use astra::{Body, Request};
use chrono::Utc;
use http::Method;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Initialize a fresh test DB using the production schema.
/// Each call gets its own file so tests can run in parallel.
pub fn init_test_db() -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("lead_sentinel_test_{nanos}_{n}.sqlite3"));

    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub fn seed_lead(db: &Database, place_id: &str, business_data: Value, is_watched: bool) -> LeadId {
    let lead = NewLead {
        owner: 1,
        business_name: format!("Business {place_id}"),
        place_id: place_id.to_string(),
        business_data,
        is_watched,
    };
    db.with_conn(|conn| insert_lead(conn, &lead, Utc::now()))
        .expect("seed lead")
}

/// What the analyzer reports for a page it could load. A site that answered
/// with an error status gets no quality score and no stack, like the real
/// analyzer.
pub fn analysis(accessible: bool, ssl: bool, score: i64, technologies: &[&str]) -> AnalysisReport {
    AnalysisReport {
        website_status: WebsiteStatus {
            accessible,
            status_code: Some(if accessible { 200 } else { 503 }),
            ssl_certificate: Some(ssl),
            ..WebsiteStatus::default()
        },
        website_quality: accessible.then(|| WebsiteQuality {
            performance_score: score,
            issues: Vec::new(),
        }),
        technologies: accessible.then(|| technologies.iter().map(|t| t.to_string()).collect()),
        analyzed_at: Utc::now(),
    }
}

/// What the analyzer reports when the host refuses connections.
pub fn unreachable() -> AnalysisReport {
    AnalysisReport {
        website_status: WebsiteStatus {
            accessible: false,
            status_code: None,
            error: Some("error trying to connect: Connection refused".into()),
            last_checked: Some(Utc::now()),
            ..WebsiteStatus::default()
        },
        website_quality: None,
        technologies: None,
        analyzed_at: Utc::now(),
    }
}

pub fn request(method: Method, uri: &str, body: Option<&str>) -> Request {
    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };
    let mut req = Request::new(body);
    *req.method_mut() = method;
    *req.uri_mut() = uri.parse().unwrap();
    req
}

pub fn body_json(resp: astra::Response) -> Value {
    use std::io::Read;
    let mut raw = String::new();
    resp.into_body()
        .reader()
        .read_to_string(&mut raw)
        .expect("read response body");
    serde_json::from_str(&raw).expect("response body is JSON")
}

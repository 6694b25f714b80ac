use super::test_state;
use crate::app::AppState;
use crate::db::connection::Database;
use crate::db::leads::find_lead;
use crate::db::SqliteStore;
use crate::errors::ServerError;
use crate::responses::json_error_response;
use crate::router::handle;
use crate::sentinel::{Sentinel, SentinelConfig};
use crate::tests::fakes::{FakeAnalyzer, FakeStore};
use crate::tests::utils::{analysis, body_json, init_test_db, request, seed_lead};
use http::Method;
use serde_json::json;
use std::sync::Arc;

#[test]
fn scan_endpoint_reports_counts_and_writes_notifications() -> Result<(), Box<dyn std::error::Error>> {
    let db = init_test_db();
    let down = seed_lead(
        &db,
        "place-down",
        json!({
            "website": "https://down.example",
            "website_status": { "accessible": true, "ssl_certificate": true },
        }),
        true,
    );
    seed_lead(&db, "place-none", json!({ "website": "N/A" }), true);
    seed_lead(&db, "place-unwatched", json!({ "website": "https://quiet.example" }), false);

    let analyzer = FakeAnalyzer::default()
        .respond("https://down.example", analysis(false, true, 40, &[]));
    let state = test_state(db.clone(), analyzer);

    let resp = handle(request(Method::POST, "/api/sentinel/scan", None), &state)?;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        body_json(resp),
        json!({
            "message": "Lead Sentinel scan complete. Scanned 1 leads and created 1 new notifications (0 failed, 1 skipped)."
        })
    );

    let resp = handle(
        request(Method::GET, "/api/notifications?userId=1", None),
        &state,
    )?;
    let notes = body_json(resp);
    assert_eq!(notes.as_array().map(Vec::len), Some(1));
    assert_eq!(notes[0]["type"], "website_down");
    assert_eq!(notes[0]["lead"], json!(down));
    assert_eq!(notes[0]["isRead"], json!(false));

    let lead = db.with_conn(|conn| find_lead(conn, down))?.expect("lead");
    assert!(lead.last_scanned.is_some());
    assert_eq!(lead.business_data["website"], "https://down.example");
    assert_eq!(lead.business_data["website_status"]["accessible"], json!(false));
    Ok(())
}

#[test]
fn scan_is_recorded_in_the_run_ledger() -> Result<(), Box<dyn std::error::Error>> {
    let db = init_test_db();
    let state = test_state(db, FakeAnalyzer::default());

    handle(request(Method::GET, "/api/sentinel/scan", None), &state)?;
    let runs = body_json(handle(
        request(Method::GET, "/api/sentinel/runs", None),
        &state,
    )?);

    assert_eq!(runs.as_array().map(Vec::len), Some(1));
    assert_eq!(runs[0]["success"], json!(true));
    assert_eq!(runs[0]["watched"], json!(0));
    assert!(runs[0]["finishedAt"].is_string());
    Ok(())
}

#[test]
fn unreachable_store_fails_the_scan_with_500() {
    let db = Database::new("/nonexistent/dir/lead_sentinel.sqlite3");
    let state = test_state(db, FakeAnalyzer::default());

    let err = handle(request(Method::POST, "/api/sentinel/scan", None), &state).unwrap_err();
    assert!(matches!(err, ServerError::ScanFailed(_)));

    let resp = json_error_response(err);
    assert_eq!(resp.status(), 500);
    let body = body_json(resp);
    assert_eq!(body["error"], "Scan failed.");
    assert!(body["details"].is_string());
}

#[test]
fn unknown_route_is_404() {
    let state = test_state(init_test_db(), FakeAnalyzer::default());

    let err = handle(request(Method::DELETE, "/api/sentinel/scan", None), &state).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
    assert_eq!(json_error_response(err).status(), 404);
}

#[test]
fn failed_scan_is_recorded_in_the_run_ledger() -> Result<(), Box<dyn std::error::Error>> {
    let db = init_test_db();
    let broken = Arc::new(FakeStore {
        fail_find: true,
        ..FakeStore::default()
    });
    let state = AppState {
        db: db.clone(),
        store: Arc::new(SqliteStore::new(db)),
        sentinel: Sentinel::new(
            broken.clone(),
            broken,
            Arc::new(FakeAnalyzer::default()),
            SentinelConfig::default(),
        ),
    };

    let err = handle(request(Method::POST, "/api/sentinel/scan", None), &state).unwrap_err();
    assert!(matches!(err, ServerError::ScanFailed(_)));

    let runs = body_json(handle(
        request(Method::GET, "/api/sentinel/runs", None),
        &state,
    )?);
    assert_eq!(runs.as_array().map(Vec::len), Some(1));
    assert_eq!(runs[0]["success"], json!(false));
    assert!(runs[0]["finishedAt"].is_string());
    assert!(runs[0]["errorMessage"]
        .as_str()
        .is_some_and(|m| m.contains("database is gone")));
    Ok(())
}

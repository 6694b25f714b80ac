use super::test_state;
use crate::db::leads::find_lead;
use crate::errors::ServerError;
use crate::responses::json_error_response;
use crate::router::handle;
use crate::tests::fakes::FakeAnalyzer;
use crate::tests::utils::{analysis, body_json, init_test_db, request, seed_lead};
use http::Method;
use serde_json::json;

#[test]
fn status_edit_stamps_contacted_date_and_keeps_business_data(
) -> Result<(), Box<dyn std::error::Error>> {
    let db = init_test_db();
    let data = json!({ "website": "https://crm.example", "rating": 4.5 });
    let id = seed_lead(&db, "place-crm", data.clone(), true);
    let state = test_state(db, FakeAnalyzer::default());

    let resp = handle(
        request(
            Method::PATCH,
            &format!("/api/leads/{id}"),
            Some(r#"{"status": "contacted", "notes": "called Monday"}"#),
        ),
        &state,
    )?;
    assert_eq!(resp.status(), 200);
    let lead = body_json(resp);
    assert_eq!(lead["status"], "contacted");
    assert_eq!(lead["notes"], "called Monday");
    assert!(lead["contactedDate"].is_string());
    assert_eq!(lead["businessData"], data);
    Ok(())
}

#[test]
fn empty_or_unknown_edits_are_rejected() {
    let db = init_test_db();
    let id = seed_lead(&db, "place-x", json!({}), true);
    let state = test_state(db, FakeAnalyzer::default());

    let err = handle(
        request(Method::PATCH, &format!("/api/leads/{id}"), Some("{}")),
        &state,
    )
    .unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(_)));

    let err = handle(
        request(
            Method::PATCH,
            &format!("/api/leads/{id}"),
            Some(r#"{"status": "archived"}"#),
        ),
        &state,
    )
    .unwrap_err();
    match err {
        ServerError::BadRequest(msg) => assert!(msg.contains("archived")),
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[test]
fn editing_a_missing_lead_is_404() {
    let state = test_state(init_test_db(), FakeAnalyzer::default());

    let err = handle(
        request(Method::PATCH, "/api/leads/404", Some(r#"{"isWatched": false}"#)),
        &state,
    )
    .unwrap_err();
    match err {
        ServerError::ResourceNotFound(msg) => assert_eq!(msg, "Lead not found"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn created_lead_is_listed_for_its_owner_and_scanned() -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = FakeAnalyzer::default()
        .respond("https://created.example", analysis(false, true, 0, &[]));
    let state = test_state(init_test_db(), analyzer);

    let resp = handle(
        request(
            Method::POST,
            "/api/leads",
            Some(
                r#"{
                    "userId": 9,
                    "businessName": "Created Co",
                    "placeId": "place-created",
                    "businessData": {
                        "website": "https://created.example",
                        "website_status": { "accessible": true }
                    },
                    "isWatched": true
                }"#,
            ),
        ),
        &state,
    )?;
    assert_eq!(resp.status(), 201);
    let created = body_json(resp);
    assert_eq!(created["owner"], json!(9));
    assert_eq!(created["status"], "new");
    assert_eq!(created["isWatched"], json!(true));

    let mine = body_json(handle(request(Method::GET, "/api/leads?userId=9", None), &state)?);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    assert_eq!(mine[0]["id"], created["id"]);
    let theirs = body_json(handle(request(Method::GET, "/api/leads?userId=10", None), &state)?);
    assert_eq!(theirs, json!([]));

    // The stored businessData is the baseline of the first scan.
    handle(request(Method::POST, "/api/sentinel/scan", None), &state)?;
    let notes = body_json(handle(
        request(Method::GET, "/api/notifications?userId=9", None),
        &state,
    )?);
    assert_eq!(notes.as_array().map(Vec::len), Some(1));
    assert_eq!(notes[0]["type"], "website_down");
    Ok(())
}

#[test]
fn create_lead_validates_and_rejects_duplicates() {
    let state = test_state(init_test_db(), FakeAnalyzer::default());
    let body = r#"{"userId": 1, "businessName": "Dup", "placeId": "place-dup"}"#;

    let err = handle(
        request(Method::POST, "/api/leads", Some(r#"{"userId": 1, "businessName": "  "}"#)),
        &state,
    )
    .unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(_)));

    let resp = handle(request(Method::POST, "/api/leads", Some(body)), &state).unwrap();
    assert_eq!(resp.status(), 201);
    assert_eq!(body_json(resp)["businessData"], json!({}));

    let err = handle(request(Method::POST, "/api/leads", Some(body)), &state).unwrap_err();
    match &err {
        ServerError::AlreadyExists(msg) => assert!(msg.contains("place-dup")),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(json_error_response(err).status(), 409);
}

#[test]
fn listing_leads_requires_user_id() {
    let state = test_state(init_test_db(), FakeAnalyzer::default());
    let err = handle(request(Method::GET, "/api/leads", None), &state).unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(_)));
}

#[test]
fn scan_and_user_edit_do_not_clobber_each_other() -> Result<(), Box<dyn std::error::Error>> {
    let db = init_test_db();
    let id = seed_lead(
        &db,
        "place-both",
        json!({
            "website": "https://both.example",
            "website_status": { "accessible": true, "ssl_certificate": true },
        }),
        true,
    );
    let analyzer = FakeAnalyzer::default()
        .respond("https://both.example", analysis(true, false, 75, &["Wix"]));
    let state = test_state(db.clone(), analyzer);

    handle(
        request(
            Method::PATCH,
            &format!("/api/leads/{id}"),
            Some(r#"{"status": "proposal", "notes": "sent quote"}"#),
        ),
        &state,
    )?;
    handle(request(Method::POST, "/api/sentinel/scan", None), &state)?;

    let lead = db.with_conn(|conn| find_lead(conn, id))?.expect("lead");
    assert_eq!(lead.status, "proposal");
    assert_eq!(lead.notes.as_deref(), Some("sent quote"));
    assert_eq!(lead.business_data["website_status"]["ssl_certificate"], json!(false));
    assert!(lead.last_scanned.is_some());

    // A later edit leaves the scan's snapshot alone.
    handle(
        request(
            Method::PATCH,
            &format!("/api/leads/{id}"),
            Some(r#"{"isWatched": false}"#),
        ),
        &state,
    )?;
    let lead = db.with_conn(|conn| find_lead(conn, id))?.expect("lead");
    assert!(!lead.is_watched);
    assert_eq!(lead.business_data["technologies"], json!(["Wix"]));
    Ok(())
}

use super::test_state;
use crate::db::notifications::insert_notification;
use crate::domain::changes::ChangeKind;
use crate::domain::notification::NewNotification;
use crate::errors::ServerError;
use crate::responses::json_error_response;
use crate::router::handle;
use crate::tests::fakes::FakeAnalyzer;
use crate::tests::utils::{body_json, init_test_db, request, seed_lead};
use chrono::{Duration, Utc};
use http::Method;
use serde_json::json;

fn note(lead: i64, user: i64, message: &str) -> NewNotification {
    NewNotification {
        user,
        lead,
        kind: ChangeKind::Performance,
        message: message.to_string(),
        details: json!({ "from": 80, "to": 40 }),
    }
}

#[test]
fn missing_user_id_is_rejected() {
    let state = test_state(init_test_db(), FakeAnalyzer::default());

    let err = handle(request(Method::GET, "/api/notifications", None), &state).unwrap_err();
    match err {
        ServerError::BadRequest(msg) => assert_eq!(msg, "User ID is required"),
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[test]
fn lists_newest_first_and_filters_unread() -> Result<(), Box<dyn std::error::Error>> {
    let db = init_test_db();
    let lead = seed_lead(&db, "place-1", json!({}), true);
    let now = Utc::now();
    let (older, newer) = db.with_conn(|conn| {
        let older = insert_notification(conn, &note(lead, 1, "older"), now - Duration::minutes(5))?;
        let newer = insert_notification(conn, &note(lead, 1, "newer"), now)?;
        insert_notification(conn, &note(lead, 2, "someone else"), now)?;
        Ok((older, newer))
    })?;
    let state = test_state(db, FakeAnalyzer::default());

    let all = body_json(handle(
        request(Method::GET, "/api/notifications?userId=1", None),
        &state,
    )?);
    assert_eq!(all.as_array().map(Vec::len), Some(2));
    assert_eq!(all[0]["id"], json!(newer.id));
    assert_eq!(all[1]["id"], json!(older.id));
    assert_eq!(all[0]["type"], "performance_drop");

    let resp = handle(
        request(
            Method::PATCH,
            &format!("/api/notifications/{}", newer.id),
            Some(r#"{"isRead": true}"#),
        ),
        &state,
    )?;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["isRead"], json!(true));

    let unread = body_json(handle(
        request(Method::GET, "/api/notifications?userId=1&unread=true", None),
        &state,
    )?);
    assert_eq!(unread.as_array().map(Vec::len), Some(1));
    assert_eq!(unread[0]["id"], json!(older.id));
    Ok(())
}

#[test]
fn mark_read_requires_is_read() {
    let state = test_state(init_test_db(), FakeAnalyzer::default());

    let err = handle(
        request(Method::PATCH, "/api/notifications/1", Some("{}")),
        &state,
    )
    .unwrap_err();
    match err {
        ServerError::BadRequest(msg) => assert_eq!(msg, "isRead is required"),
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[test]
fn mark_read_on_missing_notification_is_404() {
    let state = test_state(init_test_db(), FakeAnalyzer::default());

    let err = handle(
        request(Method::PATCH, "/api/notifications/999", Some(r#"{"isRead": true}"#)),
        &state,
    )
    .unwrap_err();
    match &err {
        ServerError::ResourceNotFound(msg) => assert_eq!(msg, "Notification not found"),
        other => panic!("expected not found, got {other:?}"),
    }

    let resp = json_error_response(err);
    assert_eq!(resp.status(), 404);
    assert_eq!(body_json(resp), json!({ "error": "Notification not found" }));
}

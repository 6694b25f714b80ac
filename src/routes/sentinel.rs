use crate::app::AppState;
use crate::db::sentinel_runs::{
    fail_sentinel_run, finish_sentinel_run, get_recent_sentinel_runs, start_sentinel_run,
};
use crate::errors::{ResultResp, ServerError};
use crate::responses::json_ok;
use chrono::Utc;
use serde_json::json;

/// Runs one scan cycle synchronously and records it in the run ledger.
/// The ledger is best effort: a scan is never refused because it cannot be
/// recorded.
pub fn scan(state: &AppState) -> ResultResp {
    let run_id = state
        .db
        .with_conn(|conn| start_sentinel_run(conn, Utc::now()))
        .map_err(|e| tracing::warn!("could not record sentinel run: {e}"))
        .ok();

    match state.sentinel.run_scan() {
        Ok(report) => {
            if let Some(id) = run_id {
                if let Err(e) = state
                    .db
                    .with_conn(|conn| finish_sentinel_run(conn, id, &report))
                {
                    tracing::warn!(run = id, "could not close sentinel run: {e}");
                }
            }
            json_ok(&json!({ "message": report.summary() }))
        }
        Err(e) => {
            tracing::error!("Lead Sentinel scan failed: {e}");
            if let Some(id) = run_id {
                if let Err(ledger) = state
                    .db
                    .with_conn(|conn| fail_sentinel_run(conn, id, Utc::now(), &e.to_string()))
                {
                    tracing::warn!(run = id, "could not close failed sentinel run: {ledger}");
                }
            }
            Err(ServerError::ScanFailed(e.to_string()))
        }
    }
}

pub fn runs(state: &AppState) -> ResultResp {
    let runs = state.db.with_conn(|conn| get_recent_sentinel_runs(conn))?;
    json_ok(&runs)
}

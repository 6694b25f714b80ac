use crate::errors::ServerError;
use crate::sentinel::ScanReport;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentinelRun {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub watched: Option<i64>,
    pub scanned: Option<i64>,
    pub skipped: Option<i64>,
    pub failed: Option<i64>,
    pub notifications_created: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn start_sentinel_run(conn: &Connection, now: DateTime<Utc>) -> Result<i64, ServerError> {
    conn.execute(
        "INSERT INTO sentinel_runs (started_at, success) VALUES (?1, 0)",
        params![now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Closes a run with the cycle's counts. Per-lead failures are kept as a
/// short digest in `error_message`.
pub fn finish_sentinel_run(
    conn: &Connection,
    run_id: i64,
    report: &ScanReport,
) -> Result<(), ServerError> {
    let digest = (!report.failures.is_empty()).then(|| {
        report
            .failures
            .iter()
            .map(|f| format!("lead {} ({}): {}", f.lead, f.stage, f.error))
            .collect::<Vec<_>>()
            .join("; ")
    });

    conn.execute(
        r#"
        UPDATE sentinel_runs SET
            finished_at = ?1, watched = ?2, scanned = ?3, skipped = ?4, failed = ?5,
            notifications_created = ?6, success = 1, error_message = ?7
        WHERE id = ?8
        "#,
        params![
            report.finished_at,
            report.watched as i64,
            report.scanned as i64,
            report.skipped as i64,
            report.failed() as i64,
            report.notifications_created as i64,
            digest,
            run_id,
        ],
    )?;
    Ok(())
}

pub fn fail_sentinel_run(
    conn: &Connection,
    run_id: i64,
    now: DateTime<Utc>,
    error: &str,
) -> Result<(), ServerError> {
    conn.execute(
        "UPDATE sentinel_runs SET finished_at = ?1, success = 0, error_message = ?2 WHERE id = ?3",
        params![now, error, run_id],
    )?;
    Ok(())
}

pub fn get_recent_sentinel_runs(conn: &Connection) -> Result<Vec<SentinelRun>, ServerError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, started_at, finished_at, watched, scanned, skipped, failed,
               notifications_created, success, error_message
        FROM sentinel_runs
        ORDER BY started_at DESC, id DESC
        LIMIT 50
        "#,
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(SentinelRun {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            watched: row.get(3)?,
            scanned: row.get(4)?,
            skipped: row.get(5)?,
            failed: row.get(6)?,
            notifications_created: row.get(7)?,
            success: row.get(8)?,
            error_message: row.get(9)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}

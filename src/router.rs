use crate::app::AppState;
use crate::errors::{ResultResp, ServerError};
use crate::routes;
use astra::Request;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    tracing::debug!(%method, %path, "request");

    match (method.as_str(), segments.as_slice()) {
        // Triggered by an external scheduler (cron) or by hand.
        ("GET" | "POST", ["api", "sentinel", "scan"]) => routes::sentinel::scan(state),
        ("GET", ["api", "sentinel", "runs"]) => routes::sentinel::runs(state),

        ("GET", ["api", "notifications"]) => {
            routes::notifications::list(&parse_query(&req), state)
        }
        ("PATCH", ["api", "notifications", id]) => {
            routes::notifications::mark_read(parse_id(id)?, read_json(req)?, state)
        }

        ("GET", ["api", "leads"]) => routes::leads::list(&parse_query(&req), state),
        ("POST", ["api", "leads"]) => routes::leads::create(read_json(req)?, state),
        ("PATCH", ["api", "leads", id]) => routes::leads::edit(parse_id(id)?, read_json(req)?, state),

        _ => Err(ServerError::NotFound),
    }
}

pub fn parse_query(req: &Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for pair in q.split('&') {
            let mut parts = pair.splitn(2, '=');
            if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }

    map
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::BadRequest(format!("Invalid id: {raw}")))
}

fn read_json<T: DeserializeOwned>(req: Request) -> Result<T, ServerError> {
    let mut body = String::new();
    req.into_body()
        .reader()
        .read_to_string(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("Unreadable body: {e}")))?;
    Ok(serde_json::from_str(&body)?)
}

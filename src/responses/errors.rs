use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

/// Convert a ServerError into a JSON error response:
/// `{"error": ...}` plus `"details"` for server-side failures.
pub fn json_error_response(err: ServerError) -> Response {
    let (status, body) = match &err {
        ServerError::NotFound => (404, json!({ "error": "Not Found" })),
        ServerError::ResourceNotFound(msg) => (404, json!({ "error": msg })),
        ServerError::BadRequest(msg) => (400, json!({ "error": msg })),
        ServerError::AlreadyExists(msg) => (409, json!({ "error": msg })),
        ServerError::Conflict(msg) => (
            409,
            json!({ "error": "Write conflict, try again.", "details": msg }),
        ),
        ServerError::ScanFailed(details) => {
            (500, json!({ "error": "Scan failed.", "details": details }))
        }
        ServerError::DbError(msg) => (
            500,
            json!({ "error": "Database error.", "details": msg }),
        ),
        ServerError::InternalError => (500, json!({ "error": "Internal Server Error" })),
    };

    if status >= 500 {
        tracing::error!(status, "request failed: {err}");
    }

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}

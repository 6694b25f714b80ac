// errors.rs
use astra::Response;
use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB, scan).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    /// A named record the request refers to does not exist.
    #[error("{0}")]
    ResourceNotFound(String),
    /// Insert would duplicate a unique key.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Database Error: {0}")]
    DbError(String),
    /// SQLite reported the database busy or locked by another writer.
    #[error("Write conflict: {0}")]
    Conflict(String),
    #[error("Scan failed: {0}")]
    ScanFailed(String),
    #[error("Internal Server Error")]
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return ServerError::AlreadyExists(e.to_string());
            }
            _ => {}
        }
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                ServerError::Conflict(e.to_string())
            }
            _ => ServerError::DbError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("Invalid JSON: {e}"))
    }
}

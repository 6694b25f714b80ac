use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Client setup failed: {0}")]
    Client(String),
}

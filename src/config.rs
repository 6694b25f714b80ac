use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::changes::{ChangeDetector, DEFAULT_PERFORMANCE_DROP_THRESHOLD};
use crate::sentinel::{RetryPolicy, SentinelConfig};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub schema_path: String,
    pub bind_addr: SocketAddr,
    pub max_workers: usize,
    pub db_busy_timeout: Duration,
    pub analyzer_timeout: Duration,
    pub sentinel: SentinelConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            db_path: env::var("SENTINEL_DB_PATH")
                .unwrap_or_else(|_| "lead_sentinel.sqlite3".to_string()),
            schema_path: env::var("SENTINEL_SCHEMA_PATH")
                .unwrap_or_else(|_| "sql/schema.sql".to_string()),
            bind_addr: parse_var("SENTINEL_BIND_ADDR", "127.0.0.1:3000".parse()?)?,
            max_workers: parse_var("SENTINEL_MAX_WORKERS", 8)?,
            db_busy_timeout: Duration::from_millis(parse_var("SENTINEL_DB_BUSY_TIMEOUT_MS", 250)?),
            analyzer_timeout: Duration::from_secs(parse_var(
                "SENTINEL_ANALYZER_TIMEOUT_SECS",
                30,
            )?),
            sentinel: SentinelConfig {
                batch_limit: parse_var("SENTINEL_BATCH_LIMIT", 100)?,
                concurrency: parse_var("SENTINEL_CONCURRENCY", 5)?,
                retry: RetryPolicy {
                    max_attempts: parse_var("SENTINEL_RETRY_ATTEMPTS", 3)?,
                    delay: Duration::from_millis(parse_var("SENTINEL_RETRY_DELAY_MS", 100)?),
                    jitter: Duration::from_millis(parse_var("SENTINEL_RETRY_JITTER_MS", 50)?),
                },
                detector: ChangeDetector {
                    performance_drop_threshold: parse_var(
                        "SENTINEL_PERFORMANCE_DROP_THRESHOLD",
                        DEFAULT_PERFORMANCE_DROP_THRESHOLD,
                    )?,
                },
            },
        })
    }
}

/// Reads `key`, falling back to `default` when unset.
fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid value, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

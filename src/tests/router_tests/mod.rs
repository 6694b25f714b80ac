mod lead_tests;
mod notification_tests;
mod scan_tests;

use crate::app::AppState;
use crate::db::connection::Database;
use crate::sentinel::{RetryPolicy, SentinelConfig};
use crate::tests::fakes::FakeAnalyzer;
use std::sync::Arc;

/// App state over a real database with a scripted analyzer.
fn test_state(db: Database, analyzer: FakeAnalyzer) -> AppState {
    let config = SentinelConfig {
        concurrency: 1,
        retry: RetryPolicy::immediate(3),
        ..SentinelConfig::default()
    };
    AppState::new(db, Arc::new(analyzer), config)
}

use crate::analyzer::SiteAnalyzer;
use crate::db::{Database, SqliteStore};
use crate::sentinel::{Sentinel, SentinelConfig};
use std::sync::Arc;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub db: Database,
    pub store: Arc<SqliteStore>,
    pub sentinel: Sentinel,
}

impl AppState {
    pub fn new(db: Database, analyzer: Arc<dyn SiteAnalyzer>, config: SentinelConfig) -> Self {
        let store = Arc::new(SqliteStore::new(db.clone()));
        let sentinel = Sentinel::new(store.clone(), store.clone(), analyzer, config);
        Self {
            db,
            store,
            sentinel,
        }
    }
}

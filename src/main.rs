use crate::analyzer::HttpSiteAnalyzer;
use crate::app::AppState;
use crate::config::Config;
use crate::db::{init_db, Database};
use crate::responses::json_error_response;
use crate::router::handle;
use anyhow::{Context, Result};
use astra::Server;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod analyzer;
mod app;
mod config;
mod db;
mod domain;
mod errors;
mod responses;
mod router;
mod routes;
mod sentinel;

#[cfg(test)]
mod tests;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lead_sentinel=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let db = Database::new(config.db_path.clone()).with_busy_timeout(config.db_busy_timeout);
    init_db(&db, &config.schema_path).context("Database initialization failed")?;

    let analyzer = HttpSiteAnalyzer::new(config.analyzer_timeout)
        .context("Failed to build website analyzer")?;
    let state = AppState::new(db, Arc::new(analyzer), config.sentinel.clone());

    tracing::info!("Starting server at http://{}", config.bind_addr);

    let server = Server::bind(&config.bind_addr).max_workers(config.max_workers);
    server
        .serve(move |req, _info| match handle(req, &state) {
            Ok(resp) => resp,
            Err(err) => json_error_response(err),
        })
        .context("Server ended with error")?;

    tracing::info!("Server shut down cleanly.");
    Ok(())
}

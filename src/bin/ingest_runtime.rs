//! Ingest Runtime - resumable round ingestion service
//!
//! Polls the chain API for newly finalized rounds, folds transfer amounts
//! into the SQLite-backed aggregate, and appends an audit trail of transfer
//! events as JSONL. Restart-safe: resumes from the persisted cursor.
//!
//! Usage:
//!   cargo run --release --bin ingest_runtime
//!
//! Environment variables:
//!   CHAIN_API_URL        - Base URL of the chain API (required)
//!   POLL_INTERVAL_SECS   - Seconds between poll cycles (default: 5)
//!   REQUEST_TIMEOUT_SECS - Per-request deadline (default: 10)
//!   METRICS_DB_PATH      - SQLite database path (default: data/metrics.db)
//!   EVENTS_JSONL_PATH    - Audit trail path (default: data/events.jsonl)

use dotenv::dotenv;
use log::{error, info};
use roundflow::chain_client::HttpChainClient;
use roundflow::event_sink::JsonlEventSink;
use roundflow::ingest_core::config::IngestConfig;
use roundflow::ingest_core::ingestor::Ingestor;
use roundflow::repository::{MetricsRepository, SqliteMetricsRepository};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = IngestConfig::from_env()?;

    info!("🚀 Ingest Runtime");
    info!("   ├─ Chain API: {}", config.chain_api_url);
    info!("   ├─ Poll interval: {:?}", config.poll_interval);
    info!("   ├─ Request timeout: {:?}", config.request_timeout);
    info!("   ├─ Metrics DB: {}", config.db_path);
    info!("   └─ Events JSONL: {}", config.events_path);

    let repo = Arc::new(SqliteMetricsRepository::new(&config.db_path)?);
    repo.init().await?;

    let client = Arc::new(HttpChainClient::new(
        config.chain_api_url.clone(),
        config.request_timeout,
    )?);
    let sink = Box::new(JsonlEventSink::new(&config.events_path));

    let mut ingestor = Ingestor::new(client, repo, sink, config.poll_interval);

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️  Received CTRL+C, shutting down...");
                ctrl_c_cancel.cancel();
            }
            Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
        }
    });

    match ingestor.run(cancel).await {
        Err(e) if e.is_cancelled() => {
            info!("✅ Ingest runtime stopped");
            Ok(())
        }
        Err(e) => {
            error!("❌ Ingest runtime failed: {}", e);
            Err(e.into())
        }
        Ok(()) => Ok(()),
    }
}

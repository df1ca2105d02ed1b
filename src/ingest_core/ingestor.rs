//! Round ingestion loop
//!
//! Polls the chain API at a fixed interval, processes every round past the
//! persisted cursor in ascending order, and saves `(aggregate, cursor)`
//! durably before emitting that round's events to the audit sink. A round is
//! either fully reflected in the saved state or not at all, so replaying a
//! failed round never double-counts amounts.

use crate::chain_client::{ChainClient, ClientError};
use crate::event_sink::{Event, EventSink};
use crate::ingest_core::metrics::Metrics;
use crate::repository::{MetricsRepository, StoreError};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const TRANSFER_TYPE: &str = "txfer";

#[derive(Debug)]
pub enum IngestError {
    /// Remote status/round fetch failure, including malformed payloads.
    /// Retried on the next timer fire.
    Fetch(ClientError),
    /// Durable load/save failure. The in-flight round delta is discarded and
    /// the round retried in full on the next cycle.
    Persistence(StoreError),
    /// The designated shutdown outcome, not an operational error.
    Cancelled,
}

impl IngestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }
}

impl From<ClientError> for IngestError {
    fn from(err: ClientError) -> Self {
        IngestError::Fetch(err)
    }
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        IngestError::Persistence(err)
    }
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Fetch(e) => write!(f, "Fetch error: {}", e),
            IngestError::Persistence(e) => write!(f, "Persistence error: {}", e),
            IngestError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Orchestrates polling, round iteration, filtering, aggregation, and
/// persistence. All capabilities are injected; no globals.
pub struct Ingestor {
    client: Arc<dyn ChainClient>,
    repo: Arc<dyn MetricsRepository>,
    sink: Box<dyn EventSink>,
    poll_interval: std::time::Duration,
}

impl Ingestor {
    pub fn new(
        client: Arc<dyn ChainClient>,
        repo: Arc<dyn MetricsRepository>,
        sink: Box<dyn EventSink>,
        poll_interval: std::time::Duration,
    ) -> Self {
        Self {
            client,
            repo,
            sink,
            poll_interval,
        }
    }

    /// Run the poll loop until the token is cancelled.
    ///
    /// Cycles never overlap: the next tick is not awaited until the current
    /// cycle returns, and missed ticks are skipped rather than backlogged, so
    /// a slow catch-up cycle eats into idle time instead of spawning
    /// concurrent cycles. The only exit is `Err(IngestError::Cancelled)`;
    /// fetch and persistence failures are logged and retried on the next
    /// fire.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), IngestError> {
        log::info!("🚀 Starting ingestor");
        log::debug!("   └─ Poll interval: {:?}", self.poll_interval);

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    log::info!("⚠️  Cancellation requested, stopping ingestor");
                    return Err(IngestError::Cancelled);
                }
                _ = ticker.tick() => {
                    match self.poll_once(&cancel).await {
                        Ok(0) => log::debug!("No new rounds"),
                        Ok(rounds) => log::info!("✅ Cycle complete: {} round(s) processed", rounds),
                        Err(e) if e.is_cancelled() => {
                            log::info!("⚠️  Cancellation requested mid-cycle, stopping ingestor");
                            return Err(e);
                        }
                        Err(e) => log::error!("❌ Cycle failed, will retry: {}", e),
                    }
                }
            }
        }
    }

    /// One poll cycle: fetch the remote latest round, reload durable state,
    /// and process every round in `(cursor, latest]` strictly ascending.
    ///
    /// Aborts on the first failing round, leaving the cursor at the last
    /// durably saved value. Returns the number of rounds processed.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<u64, IngestError> {
        let latest = self.client.latest_round().await?;

        // Always reload from the store: cheap at poll granularity, and a
        // stale cache would be a correctness risk.
        let mut metrics = self.repo.load().await?;

        if latest <= metrics.last_round {
            return Ok(0);
        }

        let mut processed = 0;
        for round in metrics.last_round + 1..=latest {
            if cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }
            self.process_round(round, &mut metrics).await?;
            processed += 1;
        }

        Ok(processed)
    }

    /// Process one round: fetch, filter transfers, fold into a copy of the
    /// aggregate, save durably, then (and only then) commit the copy and emit
    /// the round's events.
    async fn process_round(&mut self, round: u64, metrics: &mut Metrics) -> Result<(), IngestError> {
        let block = self.client.fetch_round(round).await?;

        let mut next = metrics.clone();
        let mut events = Vec::new();

        for envelope in &block.txs {
            if envelope.tx.kind != TRANSFER_TYPE {
                continue;
            }

            next.update(envelope.tx.amount, round);
            events.push(Event {
                round,
                sig: envelope.sig.clone(),
                sender: envelope.tx.sender,
                recipient: envelope.tx.recipient(),
                amount: envelope.tx.amount,
            });
        }

        // Rounds without transfers still advance the cursor.
        next.last_round = round;

        // Save failure drops `next` entirely; this round replays from the
        // last durably saved state on the next cycle.
        self.repo.save(&next).await?;
        *metrics = next;

        // Emit only after the save succeeded, so the audit trail never
        // reports an event that durable state does not reflect. Best-effort:
        // an append failure is logged, not retried.
        if !events.is_empty() {
            if let Err(e) = self.sink.append(&events).await {
                log::warn!("⚠️  Failed to append {} event(s) for round {}: {}", events.len(), round, e);
            }
        }

        log::info!(
            "📊 Round {}: {} transfer(s) | count={} sum={} avg={:.2}",
            round,
            events.len(),
            metrics.count,
            metrics.sum,
            metrics.average()
        );

        Ok(())
    }
}

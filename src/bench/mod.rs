//! Benchmark engine: endpoint pool, burst sender, sampling window, and the
//! orchestrator that runs them against each configured server in turn.

pub mod pool;
pub mod sender;
pub mod window;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

use crate::config::{Config, ServerTarget};
use crate::report::{self, ServerResult};

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("no endpoints could be bound for server {name:?}")]
    NoEndpoints {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Shared counters
// ---------------------------------------------------------------------------

/// The only shared mutable state of one test run.
///
/// `received` is incremented by every endpoint's receive task and swapped to
/// zero once per tick by the sampling window. `lost` is incremented by send
/// failures and by empty sampling windows.
#[derive(Debug, Default)]
pub struct SharedCounters {
    received: AtomicU64,
    lost: AtomicU64,
}

impl SharedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one inbound datagram.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot and reset the window counter. Increments racing past the
    /// swap land in the next window; none are dropped.
    pub fn take_received(&self) -> u64 {
        self.received.swap(0, Ordering::Relaxed)
    }

    /// Record `n` lost packets (failed sends or one empty window).
    pub fn record_lost(&self, n: u64) {
        self.lost.fetch_add(n, Ordering::Relaxed);
    }

    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run the full benchmark: every configured server, sequentially, with a
/// cooldown pause between servers. Returns the ranked result list.
pub async fn run_all(config: &Config) -> Result<Vec<ServerResult>> {
    config.validate()?;

    let corpus: Arc<[String]> = config.messages.clone().into();
    let mut results = Vec::with_capacity(config.servers.len());

    for (i, server) in config.servers.iter().enumerate() {
        let result = test_server(server, config, &corpus).await?;
        info!(
            server = %server.name,
            average = result.average,
            lost_packets = result.lost_packets,
            "server test finished"
        );
        results.push(result);

        if i + 1 < config.servers.len() {
            info!(
                cooldown_ms = config.wait_between_tests_ms,
                "cooling down before next server"
            );
            tokio::time::sleep(Duration::from_millis(config.wait_between_tests_ms)).await;
        }
    }

    Ok(report::rank(results))
}

/// Run one server's test to completion: open the endpoint pool, start the
/// burst-send loop, run the sampling window until it accepts enough runs (or
/// gives up), then tear everything down.
async fn test_server(
    server: &ServerTarget,
    config: &Config,
    corpus: &Arc<[String]>,
) -> Result<ServerResult> {
    let target = server.socket_addr()?;
    info!(
        server = %server.name,
        address = %server.address,
        protocol = %server.protocol,
        clients = config.clients,
        "connecting endpoints"
    );

    let bind_start = Instant::now();
    let counters = Arc::new(SharedCounters::new());
    let pool = Arc::new(
        pool::EndpointPool::open(config.clients, counters.clone(), config.log_messages)
            .await
            .map_err(|source| BenchError::NoEndpoints {
                name: server.name.clone(),
                source,
            })?,
    );
    info!(
        server = %server.name,
        endpoints = pool.live_count(),
        elapsed_ms = bind_start.elapsed().as_millis() as u64,
        "all endpoints bound"
    );

    // The sampling window raises the stop signal; the send loop observes it
    // so both periodic tasks stop together.
    let (stop_tx, stop_rx) = watch::channel(false);
    let send_loop = sender::spawn_send_loop(
        pool.clone(),
        corpus.clone(),
        target,
        counters.clone(),
        Duration::from_millis(config.delay_ms),
        stop_rx,
        config.log_messages,
    );

    let params = window::WindowParams {
        server_name: server.name.clone(),
        period: Duration::from_millis(config.sample_window_ms),
        runs_required: config.runs_per_server,
        max_windows: config.max_windows,
        clients: config.clients,
        corpus_len: corpus.len(),
        delay_ms: config.delay_ms,
    };
    let (runs, outcome) = window::sample(&counters, &stop_tx, &params).await;

    send_loop.await.context("burst-send loop panicked")?;
    pool.close();

    Ok(ServerResult {
        name: server.name.clone(),
        average: report::mean(&runs),
        lost_packets: counters.lost(),
        percentage: 0.0,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_received_resets_to_zero() {
        let counters = SharedCounters::new();
        counters.record_received();
        counters.record_received();
        counters.record_received();
        assert_eq!(counters.take_received(), 3);
        assert_eq!(counters.take_received(), 0);
    }

    #[test]
    fn lost_accumulates_across_sources() {
        let counters = SharedCounters::new();
        counters.record_lost(1); // failed send
        counters.record_lost(1); // empty window
        counters.record_lost(3);
        assert_eq!(counters.lost(), 5);
    }

    #[tokio::test]
    async fn counter_increments_are_not_lost_under_concurrency() {
        let counters = Arc::new(SharedCounters::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let c = counters.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..1000 {
                    c.record_received();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(counters.take_received(), 8000);
    }
}

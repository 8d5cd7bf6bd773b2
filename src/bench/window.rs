//! Sampling window: the periodic measurement loop.
//!
//! Once per period the loop snapshots and resets the shared received-counter.
//! A zero snapshot is a lost interval; a nonzero one is an accepted run. The
//! loop ends after `runs_required` accepted runs, or after `max_windows`
//! ticks without enough of them, and then raises the stop signal observed by
//! the burst-send loop.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use super::SharedCounters;
use crate::report::Outcome;

/// Parameters for one server's sampling loop.
pub struct WindowParams {
    pub server_name: String,
    pub period: Duration,
    pub runs_required: usize,
    /// `0` disables the deadline; the loop then runs until enough nonzero
    /// windows occur, which on a dead target means forever.
    pub max_windows: usize,
    pub clients: usize,
    pub corpus_len: usize,
    pub delay_ms: u64,
}

/// Run the sampling loop to completion and return the accepted run sequence
/// plus how the test ended. Always raises `stop` before returning.
pub async fn sample(
    counters: &SharedCounters,
    stop: &watch::Sender<bool>,
    params: &WindowParams,
) -> (Vec<u64>, Outcome) {
    let mut ticks = tokio::time::interval(params.period);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first interval tick fires immediately; skip it so every window
    // spans a full period.
    ticks.tick().await;

    let mut runs = Vec::with_capacity(params.runs_required);
    let mut windows = 0usize;

    let outcome = loop {
        ticks.tick().await;
        windows += 1;

        let count = counters.take_received();
        info!(
            server = %params.server_name,
            count,
            clients = params.clients,
            corpus = params.corpus_len,
            delay_ms = params.delay_ms,
            "messages this window"
        );

        if count == 0 {
            counters.record_lost(1);
        } else {
            runs.push(count);
        }

        if runs.len() >= params.runs_required {
            info!(
                server = %params.server_name,
                runs = runs.len(),
                "runs completed"
            );
            break Outcome::Completed;
        }
        if params.max_windows != 0 && windows >= params.max_windows {
            warn!(
                server = %params.server_name,
                windows,
                runs = runs.len(),
                "deadline reached before enough runs, target unreachable"
            );
            break Outcome::Unreachable;
        }
    };

    // Stop the burst-send loop; an already-dropped receiver is fine.
    let _ = stop.send(true);
    (runs, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn params(runs_required: usize, max_windows: usize) -> WindowParams {
        WindowParams {
            server_name: "test".to_string(),
            period: Duration::from_millis(10),
            runs_required,
            max_windows,
            clients: 1,
            corpus_len: 1,
            delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn stops_after_exactly_the_required_runs() {
        let counters = Arc::new(SharedCounters::new());
        let (stop_tx, stop_rx) = watch::channel(false);

        // Feed the counter continuously so every window is nonzero.
        let feeder = {
            let counters = counters.clone();
            let mut stop = stop_rx;
            tokio::spawn(async move {
                loop {
                    counters.record_received();
                    tokio::select! {
                        _ = stop.changed() => break,
                        _ = tokio::time::sleep(Duration::from_millis(1)) => {}
                    }
                }
            })
        };

        let (runs, outcome) = sample(&counters, &stop_tx, &params(5, 0)).await;
        feeder.await.unwrap();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(runs.len(), 5, "never a 6th sample");
        assert!(runs.iter().all(|&r| r > 0));
        assert!(*stop_tx.borrow(), "stop signal raised");
    }

    #[tokio::test]
    async fn empty_windows_count_as_lost_and_never_as_runs() {
        let counters = Arc::new(SharedCounters::new());
        let (stop_tx, _stop_rx) = watch::channel(false);

        let (runs, outcome) = sample(&counters, &stop_tx, &params(5, 3)).await;

        assert_eq!(outcome, Outcome::Unreachable);
        assert!(runs.is_empty());
        assert_eq!(counters.lost(), 3, "one lost packet per empty window");
    }

    #[tokio::test]
    async fn mixed_windows_classify_independently() {
        let counters = Arc::new(SharedCounters::new());
        let (stop_tx, _stop_rx) = watch::channel(false);

        // Pre-load one window's worth; later windows are empty.
        counters.record_received();
        counters.record_received();

        let (runs, outcome) = sample(&counters, &stop_tx, &params(1, 10)).await;

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(runs, vec![2], "nonzero window appends exactly its count");
        assert_eq!(counters.lost(), 0);
    }
}

//! Burst sender: one full corpus pass per live endpoint, repeated on a fixed
//! cadence until the sampling window raises the stop signal.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::pool::{Endpoint, EndpointPool, EndpointState};
use super::SharedCounters;

/// Send every corpus message, in order, from every live endpoint to `target`.
///
/// One synchronous pass with no inter-message delay. Liveness is checked per
/// send, not cached, since an endpoint may be closed by its error handler
/// mid-burst. A failed send counts as a lost packet and never aborts the rest
/// of the burst.
pub async fn send_burst(
    endpoints: &[Endpoint],
    corpus: &[String],
    target: SocketAddr,
    counters: &SharedCounters,
    log_messages: bool,
) {
    for endpoint in endpoints {
        for message in corpus {
            if endpoint.state() == EndpointState::Closed {
                break;
            }
            match endpoint.socket().send_to(message.as_bytes(), target).await {
                Ok(_) => {
                    if log_messages {
                        debug!(payload = %message, %target, "sent");
                    }
                }
                Err(e) => {
                    debug!(error = %e, %target, "send failed, counting as lost");
                    counters.record_lost(1);
                }
            }
        }
    }
}

/// Spawn the burst cadence task: an immediate burst, then one per `delay`
/// tick, until `stop` flips. Coordination with the sampling window happens
/// only through the shared counters and the stop signal.
pub fn spawn_send_loop(
    pool: Arc<EndpointPool>,
    corpus: Arc<[String]>,
    target: SocketAddr,
    counters: Arc<SharedCounters>,
    delay: Duration,
    mut stop: watch::Receiver<bool>,
    log_messages: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut cadence = tokio::time::interval(delay);
        cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;

                _ = stop.changed() => {
                    debug!("stop signal received, ending burst loop");
                    break;
                }
                _ = cadence.tick() => {
                    send_burst(pool.endpoints(), &corpus, target, &counters, log_messages)
                        .await;
                }
            }
        }
    })
}

//! Endpoint pool: the client sockets that flood the target and count what
//! comes back.
//!
//! Each endpoint is one UDP socket bound to an ephemeral local port with a
//! spawned receive task that increments the shared window counter for every
//! inbound datagram. Endpoints are owned exclusively by the pool; nothing
//! outside this module closes them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::SharedCounters;

/// Liveness of one endpoint, checked by the burst sender at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Live,
    Closed,
}

/// One bound datagram socket plus its receive task.
pub struct Endpoint {
    socket: Arc<UdpSocket>,
    live: Arc<AtomicBool>,
    recv_task: JoinHandle<()>,
}

impl Endpoint {
    async fn bind(counters: Arc<SharedCounters>, log_messages: bool) -> std::io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await?);
        let live = Arc::new(AtomicBool::new(true));

        let recv_socket = socket.clone();
        let recv_live = live.clone();
        let recv_task = tokio::spawn(async move {
            let mut buf = [0u8; 65536];
            loop {
                match recv_socket.recv_from(&mut buf).await {
                    Ok((len, peer)) => {
                        counters.record_received();
                        if log_messages {
                            debug!(
                                payload = %String::from_utf8_lossy(&buf[..len]),
                                %peer,
                                "received"
                            );
                        }
                    }
                    Err(e) => {
                        // A transport error closes this endpoint only; the
                        // test continues with the rest of the pool.
                        warn!(error = %e, "endpoint receive error, closing endpoint");
                        recv_live.store(false, Ordering::Relaxed);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            socket,
            live,
            recv_task,
        })
    }

    pub fn state(&self) -> EndpointState {
        if self.live.load(Ordering::Relaxed) {
            EndpointState::Live
        } else {
            EndpointState::Closed
        }
    }

    pub fn socket(&self) -> &UdpSocket {
        &self.socket
    }

    /// Mark the endpoint closed and stop its receive task. Closing an
    /// already-closed or errored endpoint is a no-op.
    pub fn close(&self) {
        self.live.store(false, Ordering::Relaxed);
        self.recv_task.abort();
    }
}

/// The set of endpoints used for one server's test.
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
}

impl EndpointPool {
    /// Bind `n` endpoints and start their receive tasks. Returns only once
    /// every surviving endpoint is bound, so sending can start immediately
    /// (UDP needs no handshake; the awaited binds are the readiness barrier).
    ///
    /// A bind failure drops that endpoint and logs it; the pool opens with
    /// fewer endpoints. Errors only if not a single endpoint could be bound.
    pub async fn open(
        n: usize,
        counters: Arc<SharedCounters>,
        log_messages: bool,
    ) -> std::io::Result<Self> {
        let mut endpoints = Vec::with_capacity(n);
        let mut last_err = None;
        for _ in 0..n {
            match Endpoint::bind(counters.clone(), log_messages).await {
                Ok(ep) => endpoints.push(ep),
                Err(e) => {
                    warn!(error = %e, "failed to bind endpoint, continuing without it");
                    last_err = Some(e);
                }
            }
        }
        if endpoints.is_empty() {
            return Err(last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no endpoints bound")
            }));
        }
        Ok(Self { endpoints })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn live_count(&self) -> usize {
        self.endpoints
            .iter()
            .filter(|e| e.state() == EndpointState::Live)
            .count()
    }

    /// Close every endpoint. Idempotent.
    pub fn close(&self) {
        for endpoint in &self.endpoints {
            endpoint.close();
        }
    }
}

//! Built-in UDP echo server.
//!
//! Binds a UDP socket and echoes every received datagram back to its sender,
//! tracking packet and byte counts. Used as a local benchmark subject and by
//! the integration tests.

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Traffic counters reported when the server stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoStats {
    pub packets: u64,
    pub bytes: u64,
}

/// Control handle for a running echo server.
pub struct EchoHandle {
    pub port: u16,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl EchoHandle {
    /// Stop the server. The spawned task then resolves with its stats.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

pub struct EchoServer;

impl EchoServer {
    /// Start an echo server on `0.0.0.0:port` (`0` for an OS-assigned
    /// ephemeral port, exposed on the returned handle).
    pub async fn start(port: u16) -> Result<(EchoHandle, JoinHandle<EchoStats>)> {
        let bind_addr = format!("0.0.0.0:{}", port);
        let socket = UdpSocket::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind UDP socket on {}", bind_addr))?;
        let actual_port = socket
            .local_addr()
            .context("failed to get local address")?
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        info!(port = actual_port, "starting UDP echo server");

        let task = tokio::spawn(async move {
            tokio::pin!(shutdown_rx);
            let mut buf = [0u8; 65536];
            let mut stats = EchoStats::default();

            loop {
                tokio::select! {
                    biased;

                    _ = &mut shutdown_rx => {
                        debug!("shutdown signal received");
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        match result {
                            Ok((len, addr)) => {
                                if let Err(e) = socket.send_to(&buf[..len], addr).await {
                                    warn!(error = %e, "failed to echo packet");
                                    continue;
                                }
                                stats.packets += 1;
                                stats.bytes += len as u64;
                            }
                            Err(e) => {
                                warn!(error = %e, "recv_from error");
                            }
                        }
                    }
                }
            }

            info!(
                packets = stats.packets,
                bytes = stats.bytes,
                "UDP echo server stopped"
            );
            stats
        });

        Ok((
            EchoHandle {
                port: actual_port,
                shutdown_tx,
            },
            task,
        ))
    }
}

//! The protected TCP service.
//!
//! # Responsibilities
//! - Bind the protected port and accept connections
//! - Acknowledge each peer and close
//!
//! # Design Decisions
//! - Runs as an isolated task with no shared state with the tracker;
//!   admission control happens entirely at the firewall layer
//! - Bind failure is fatal at startup, like a decoy-port bind failure
//! - Application behavior is a stand-in: one acknowledgment write

use std::net::IpAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Error type for protected-service startup.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind protected port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// The stand-in service living behind the knock sequence.
pub struct ProtectedService {
    listener: TcpListener,
    port: u16,
}

impl ProtectedService {
    /// Bind the protected port. Fatal on failure.
    pub async fn bind(bind_address: IpAddr, port: u16) -> Result<Self, ServiceError> {
        let listener = TcpListener::bind((bind_address, port))
            .await
            .map_err(|source| ServiceError::Bind { port, source })?;
        tracing::info!(port, address = %bind_address, "Protected service bound");
        Ok(Self { listener, port })
    }

    /// Run the accept loop until the shutdown signal fires.
    pub fn spawn(self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::info!(port = self.port, "Protected service stopping");
                        return;
                    }
                    accepted = self.listener.accept() => {
                        match accepted {
                            Ok((mut stream, peer)) => {
                                tracing::info!(peer = %peer, port = self.port, "Connection on protected port");
                                tokio::spawn(async move {
                                    if let Err(e) = stream.write_all(b"Success").await {
                                        tracing::debug!(peer = %peer, error = %e, "Acknowledgment write failed");
                                    }
                                    let _ = stream.shutdown().await;
                                });
                            }
                            Err(e) => {
                                tracing::warn!(port = self.port, error = %e, "Accept failed on protected port");
                            }
                        }
                    }
                }
            }
        })
    }
}

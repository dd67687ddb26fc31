//! Decoy-port listener set.
//!
//! # Responsibilities
//! - Bind one UDP socket per distinct decoy port
//! - Drain every pending datagram, keeping only (source, port)
//! - Fan arrivals from all sockets into one ordered channel
//! - Fail fast at startup if any bind fails
//!
//! # Design Decisions
//! - One lightweight task per socket feeding a shared mpsc channel; no
//!   socket can spin or starve another
//! - Payload bytes are never interpreted, only the arrival matters
//! - A partial listening set is never acceptable: a missing decoy port
//!   makes the sequence unsatisfiable, so the first bind error aborts

use std::net::IpAddr;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

/// A single arrival on a decoy port. The sender's port is discarded:
/// source identity is the IP address alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Knock {
    /// Source address of the datagram.
    pub source: IpAddr,
    /// The decoy port that was hit.
    pub port: u16,
}

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Failed to bind decoy port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Arrivals routed per-socket into the channel. Sized well above anything
/// a batch drain leaves behind; knocks beyond it are dropped by the OS
/// socket buffer first in practice.
const ARRIVAL_CHANNEL_CAPACITY: usize = 1024;

/// The set of decoy-port receive endpoints.
///
/// Each socket is owned by a dedicated receive task; the set itself only
/// holds the channel the tasks feed. Dropping the set aborts the tasks and
/// closes the sockets.
pub struct KnockListenerSet {
    rx: mpsc::Receiver<Knock>,
    ports: Vec<u16>,
    tasks: Vec<JoinHandle<()>>,
}

impl KnockListenerSet {
    /// Bind every distinct port in the sequence on `bind_address`.
    ///
    /// Any bind failure (port in use, insufficient privilege) is fatal:
    /// already-bound sockets are dropped and the error is returned.
    pub async fn bind(sequence: &[u16], bind_address: IpAddr) -> Result<Self, ListenerError> {
        let mut ports: Vec<u16> = Vec::new();
        let mut sockets = Vec::new();

        for &port in sequence {
            if ports.contains(&port) {
                continue;
            }
            let socket = UdpSocket::bind((bind_address, port))
                .await
                .map_err(|source| ListenerError::Bind { port, source })?;
            tracing::info!(port, address = %bind_address, "Decoy port bound");
            ports.push(port);
            sockets.push(socket);
        }

        let (tx, rx) = mpsc::channel(ARRIVAL_CHANNEL_CAPACITY);
        let tasks = sockets
            .into_iter()
            .zip(ports.iter().copied())
            .map(|(socket, port)| tokio::spawn(receive_loop(socket, port, tx.clone())))
            .collect();

        Ok(Self { rx, ports, tasks })
    }

    /// Wait up to `timeout_after` for arrivals.
    ///
    /// Blocks until at least one knock is available, then drains whatever
    /// else is already pending so a burst is handed over as one batch.
    /// Returns an empty batch when the timeout elapses with no traffic.
    pub async fn wait_for_arrivals(&mut self, timeout_after: Duration) -> Vec<Knock> {
        let mut batch = Vec::new();

        match timeout(timeout_after, self.rx.recv()).await {
            Ok(Some(knock)) => batch.push(knock),
            // Elapsed, or all sender tasks gone.
            Err(_) | Ok(None) => return batch,
        }

        while let Ok(knock) = self.rx.try_recv() {
            batch.push(knock);
        }
        batch
    }

    /// The distinct decoy ports this set listens on, in sequence order.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }
}

impl Drop for KnockListenerSet {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Per-socket receive task: drain datagrams forever, forwarding only the
/// source address. Payload content is ignored by design.
async fn receive_loop(socket: UdpSocket, port: u16, tx: mpsc::Sender<Knock>) {
    let mut buf = [0u8; 1024];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((_, peer)) => {
                let knock = Knock {
                    source: peer.ip(),
                    port,
                };
                tracing::debug!(source = %knock.source, port, "Knock received");
                if tx.send(knock).await.is_err() {
                    // Listener set dropped; nothing left to feed.
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(port, error = %e, "Decoy socket receive failed");
            }
        }
    }
}

//! The coordinating event loop.
//!
//! # Responsibilities
//! - Install the default-deny rule before anything listens
//! - Bind the decoy listener set and the protected service
//! - Feed every arrival to the tracker, in order
//! - Hand completed sequences to the gate
//! - Sweep expired attempts and grants at least once per poll interval
//!
//! # Design Decisions
//! - One task owns all tracker and gate state; arrivals are serialized
//!   through it, so no locking anywhere in the knock path
//! - The loop never dies on a per-knock fault; only startup errors (bind
//!   failures) are fatal
//! - Sweeps run after every batch, including empty timeout batches, so a
//!   stalled attempt is cleaned up without further traffic

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::KnockConfig;
use crate::firewall::FirewallController;
use crate::knock::{AccessGate, KnockOutcome, SequenceTracker};
use crate::lifecycle::Shutdown;
use crate::net::{KnockListenerSet, ListenerError};
use crate::observability::metrics;
use crate::service::{ProtectedService, ServiceError};

/// Error type for daemon startup.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("invalid bind address {0:?}")]
    BindAddress(String),
}

/// The knock daemon: listener set, tracker, gate and protected service
/// under one event loop.
pub struct KnockServer {
    config: KnockConfig,
    firewall: Arc<dyn FirewallController>,
    shutdown: Shutdown,
}

impl KnockServer {
    pub fn new(config: KnockConfig, firewall: Arc<dyn FirewallController>) -> Self {
        Self {
            config,
            firewall,
            shutdown: Shutdown::new(),
        }
    }

    /// Handle for triggering shutdown from signal handlers or tests.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run until the shutdown signal fires.
    ///
    /// Startup order matters: default-deny first so the protected port is
    /// never reachable before the gate controls it, then the protected
    /// service, then the decoy set. Any bind failure aborts startup.
    pub async fn run(self) -> Result<(), ServerError> {
        let bind_address: IpAddr = self
            .config
            .bind_address
            .parse()
            .map_err(|_| ServerError::BindAddress(self.config.bind_address.clone()))?;

        let mut gate = AccessGate::new(
            Arc::clone(&self.firewall),
            self.config.protected_port,
            self.config.grant_ttl(),
        );
        gate.deny_all().await;

        let service = ProtectedService::bind(bind_address, self.config.protected_port).await?;
        let service_task = service.spawn(self.shutdown.subscribe());

        let mut listeners = KnockListenerSet::bind(&self.config.sequence, bind_address).await?;
        let mut tracker = SequenceTracker::new(self.config.sequence.clone(), self.config.window());

        tracing::info!(
            sequence = ?self.config.sequence,
            protected_port = self.config.protected_port,
            window_secs = self.config.window_secs,
            "Listening for knocks"
        );

        let poll_interval = self.config.poll_interval();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            let batch = tokio::select! {
                _ = shutdown_rx.recv() => break,
                batch = listeners.wait_for_arrivals(poll_interval) => batch,
            };

            let now = Instant::now();
            for knock in batch {
                metrics::record_knock(knock.port);
                tracing::info!(source = %knock.source, port = knock.port, "Knock");

                let outcome = tracker.record_knock(knock.source, knock.port, now);
                metrics::record_outcome(&outcome);
                if let KnockOutcome::Completed = outcome {
                    gate.grant(knock.source, now).await;
                }
            }

            tracker.sweep_expired(now);
            gate.sweep_expired_grants(now).await;
        }

        tracing::info!("Shutdown signal received, stopping event loop");
        let _ = service_task.await;
        Ok(())
    }
}

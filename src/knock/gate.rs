//! Grant issuance and revocation.
//!
//! # Responsibilities
//! - Turn a completed sequence into exactly one firewall open call
//! - Keep the ledger of live grants
//! - Revoke grants past the configured TTL, when one is set
//!
//! # Design Decisions
//! - Firewall command failures are operational faults: logged once, never
//!   fatal to the loop, and the failed grant is simply not enacted
//! - No deduplication beyond the tracker's own guarantee; a second full
//!   sequence from the same address yields a second, independent open
//! - A failed revocation drops the grant record anyway; rule changes are
//!   never retried automatically

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::firewall::FirewallController;
use crate::observability::metrics;

/// A live firewall exception for one source address.
#[derive(Debug, Clone, Copy)]
pub struct AccessGrant {
    pub address: IpAddr,
    pub protected_port: u16,
    pub granted_at: Instant,
}

/// Issues and revokes access grants through the firewall capability.
pub struct AccessGate {
    firewall: Arc<dyn FirewallController>,
    protected_port: u16,
    grant_ttl: Option<Duration>,
    grants: Vec<AccessGrant>,
}

impl AccessGate {
    pub fn new(
        firewall: Arc<dyn FirewallController>,
        protected_port: u16,
        grant_ttl: Option<Duration>,
    ) -> Self {
        Self {
            firewall,
            protected_port,
            grant_ttl,
            grants: Vec::new(),
        }
    }

    /// Install the blanket deny rule on the protected port. Called once at
    /// startup so the service is unreachable until a sequence completes.
    pub async fn deny_all(&self) {
        if let Err(e) = self.firewall.close_all(self.protected_port).await {
            tracing::error!(port = self.protected_port, error = %e, "Failed to install default-deny rule");
        }
    }

    /// Open the protected port for `address` and record the grant.
    pub async fn grant(&mut self, address: IpAddr, now: Instant) {
        match self.firewall.open(address, self.protected_port).await {
            Ok(()) => {
                metrics::record_grant();
                self.grants.push(AccessGrant {
                    address,
                    protected_port: self.protected_port,
                    granted_at: now,
                });
                tracing::info!(source = %address, port = self.protected_port, "Access granted");
            }
            Err(e) => {
                tracing::error!(source = %address, port = self.protected_port, error = %e, "Failed to open protected port");
            }
        }
    }

    /// Revoke every grant older than the TTL; no-op when no TTL is set.
    /// Returns how many grants were revoked.
    pub async fn sweep_expired_grants(&mut self, now: Instant) -> usize {
        let Some(ttl) = self.grant_ttl else {
            return 0;
        };

        let mut revoked = 0;
        let mut remaining = Vec::with_capacity(self.grants.len());
        for grant in self.grants.drain(..) {
            if now.duration_since(grant.granted_at) <= ttl {
                remaining.push(grant);
                continue;
            }
            revoked += 1;
            tracing::info!(source = %grant.address, port = grant.protected_port, "Grant TTL elapsed, revoking");
            if let Err(e) = self
                .firewall
                .close(grant.address, grant.protected_port)
                .await
            {
                tracing::error!(source = %grant.address, error = %e, "Failed to revoke grant");
            }
        }
        self.grants = remaining;
        revoked
    }

    /// Grants currently on the books.
    pub fn active_grants(&self) -> &[AccessGrant] {
        &self.grants
    }
}

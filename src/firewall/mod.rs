//! Firewall control subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     close_all(protected_port) → default-deny rule installed
//!
//! Completed sequence:
//!     open(source, protected_port) → per-source accept rule
//!
//! Grant TTL elapsed (optional):
//!     close(source, protected_port) → accept rule removed
//! ```
//!
//! # Design Decisions
//! - The controller is a capability trait: the event loop never knows which
//!   firewall tooling sits behind it, and tests substitute a recorder
//! - Command failures are operational faults: logged by the caller, never
//!   fatal to the loop
//! - No automatic retries; a failed rule change is surfaced once

pub mod iptables;

use std::net::IpAddr;

use async_trait::async_trait;

pub use iptables::IptablesController;

/// Error type for firewall rule changes.
#[derive(Debug, thiserror::Error)]
pub enum FirewallError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Command {
        program: String,
        status: std::process::ExitStatus,
    },
}

/// Capability for mutating firewall rules around the protected port.
///
/// Implementations must be safe to share across tasks; the daemon holds one
/// behind an `Arc`.
#[async_trait]
pub trait FirewallController: Send + Sync {
    /// Permit `address` to reach `port`.
    async fn open(&self, address: IpAddr, port: u16) -> Result<(), FirewallError>;

    /// Revoke a previously opened exception for `address` on `port`.
    async fn close(&self, address: IpAddr, port: u16) -> Result<(), FirewallError>;

    /// Deny all traffic to `port`. Invoked once at startup so the protected
    /// service is unreachable until a sequence completes.
    async fn close_all(&self, port: u16) -> Result<(), FirewallError>;
}

//! Port-knocking access-control daemon library.

pub mod config;
pub mod firewall;
pub mod knock;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;
pub mod service;

pub use config::KnockConfig;
pub use firewall::{FirewallController, FirewallError, IptablesController};
pub use knock::{AccessGate, KnockOutcome, SequenceTracker};
pub use lifecycle::Shutdown;
pub use server::KnockServer;

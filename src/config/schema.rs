//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the knock daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KnockConfig {
    /// Ordered decoy port sequence. Position 0 (re)starts the timing window.
    pub sequence: Vec<u16>,

    /// TCP port shielded behind the knock sequence.
    pub protected_port: u16,

    /// Seconds allowed between the first correct knock and sequence completion.
    pub window_secs: f64,

    /// Address the decoy sockets and the protected service bind to.
    pub bind_address: String,

    /// How long the event loop waits for arrivals before running an expiry
    /// sweep, in milliseconds.
    pub poll_interval_ms: u64,

    /// Optional grant lifetime in seconds. When set, firewall exceptions are
    /// revoked this long after being granted. Unset means grants persist.
    pub grant_ttl_secs: Option<u64>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for KnockConfig {
    fn default() -> Self {
        Self {
            sequence: vec![1234, 5678, 9012],
            protected_port: 2222,
            window_secs: 10.0,
            bind_address: "0.0.0.0".to_string(),
            poll_interval_ms: 1000,
            grant_ttl_secs: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl KnockConfig {
    /// The sequence window as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_secs)
    }

    /// The event-loop poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The grant TTL as a `Duration`, if revocation is enabled.
    pub fn grant_ttl(&self) -> Option<Duration> {
        self.grant_ttl_secs.map(Duration::from_secs)
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Whether to expose a Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Address the metrics endpoint binds to.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

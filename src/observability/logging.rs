//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Default filter when RUST_LOG is unset
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via the RUST_LOG environment variable

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG`; defaults to info-level output for the daemon itself.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knockgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters for knocks, outcomes, grants)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Structured logging with source/port fields on every protocol event
//! - Metrics are cheap (atomic increments) and recorded unconditionally;
//!   only the exporter endpoint is gated by config

pub mod logging;
pub mod metrics;

pub use logging::init_logging;

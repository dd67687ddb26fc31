//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Default-deny rule → Bind listeners → Loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → event loop and service tasks exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, firewall default-deny, listeners last
//! - Shutdown is cooperative; tasks observe the broadcast and return

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::spawn_signal_handler;

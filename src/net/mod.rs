//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! UDP datagram on any decoy port
//!     → listener.rs (per-socket receive task)
//!     → shared channel (ordered fan-in)
//!     → event loop drains batches via wait_for_arrivals
//! ```
//!
//! # Design Decisions
//! - Datagram payloads are dropped on the floor; only (source, port) flows on
//! - Fan-in preserves bounded latency: the loop wakes for the first arrival
//!   and drains the rest of the burst without further waits
//! - Bind errors abort startup; a partial decoy set is unsatisfiable

pub mod listener;

pub use listener::{Knock, KnockListenerSet, ListenerError};

//! Knock protocol subsystem.
//!
//! # Data Flow
//! ```text
//! (source, decoy port) arrival
//!     → tracker.rs (per-source state machine)
//!     → KnockOutcome { Pending | Completed | Rejected }
//!     → gate.rs on Completed (firewall open + grant ledger)
//! ```
//!
//! # Design Decisions
//! - Tracker state is owned by the event loop alone; no locks, strict
//!   arrival order per source
//! - Protocol faults (wrong order, stale attempt) are silent resets, never
//!   errors; only the outcome tag reports them
//! - The gate treats firewall failures as operational, not protocol, faults

pub mod gate;
pub mod tracker;

pub use gate::{AccessGate, AccessGrant};
pub use tracker::{KnockOutcome, RejectReason, SequenceTracker};

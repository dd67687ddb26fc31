//! Protected service subsystem.
//!
//! # Design Decisions
//! - The service is deliberately trivial; what matters to the protocol is
//!   that something answers on the protected port once the firewall lets a
//!   source through
//! - Isolation: it never touches tracker or gate state

pub mod protected;

pub use protected::{ProtectedService, ServiceError};

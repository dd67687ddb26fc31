//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the decoy sequence is non-empty and pairwise distinct
//! - Validate value ranges (window > 0, poll interval > 0, ports valid)
//! - Reject a protected port that doubles as a decoy port
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: KnockConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::IpAddr;

use crate::config::schema::KnockConfig;

/// A single semantic fault in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("knock sequence must contain at least one port")]
    EmptySequence,

    #[error("knock sequence contains port 0")]
    ZeroSequencePort,

    #[error("knock sequence contains duplicate port {0}")]
    DuplicateSequencePort(u16),

    #[error("protected port must be non-zero")]
    ZeroProtectedPort,

    #[error("protected port {0} is also a decoy port")]
    ProtectedPortInSequence(u16),

    #[error("sequence window must be positive, got {0}")]
    NonPositiveWindow(String),

    #[error("poll interval must be positive")]
    ZeroPollInterval,

    #[error("grant TTL must be positive when set")]
    ZeroGrantTtl,

    #[error("bind address {0:?} is not a valid IP address")]
    InvalidBindAddress(String),
}

/// Validate a configuration, collecting every fault.
///
/// Any fault here is fatal at startup: an unsatisfiable sequence or an
/// open-by-accident protected port must never reach the event loop.
pub fn validate_config(config: &KnockConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sequence.is_empty() {
        errors.push(ValidationError::EmptySequence);
    }
    if config.sequence.contains(&0) {
        errors.push(ValidationError::ZeroSequencePort);
    }

    let mut seen = HashSet::new();
    for &port in &config.sequence {
        if !seen.insert(port) {
            errors.push(ValidationError::DuplicateSequencePort(port));
        }
    }

    if config.protected_port == 0 {
        errors.push(ValidationError::ZeroProtectedPort);
    } else if config.sequence.contains(&config.protected_port) {
        errors.push(ValidationError::ProtectedPortInSequence(config.protected_port));
    }

    if !(config.window_secs > 0.0) {
        errors.push(ValidationError::NonPositiveWindow(config.window_secs.to_string()));
    }

    if config.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if config.grant_ttl_secs == Some(0) {
        errors.push(ValidationError::ZeroGrantTtl);
    }

    if config.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.bind_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

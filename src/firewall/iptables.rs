//! iptables-backed firewall controller.
//!
//! # Responsibilities
//! - Translate open/close/close_all into iptables rule changes
//! - Run the tool via the async process API, off the event loop's knock path
//! - Report non-zero exit status as a command failure
//!
//! # Design Decisions
//! - Rules are inserted at position 1 of the INPUT chain so the per-source
//!   ACCEPT lands above the blanket DROP
//! - Argument vectors are built by pure helpers so rule shapes are testable
//!   without privileges

use std::net::IpAddr;

use async_trait::async_trait;
use tokio::process::Command;

use crate::firewall::{FirewallController, FirewallError};

/// Controller that shells out to `iptables`.
pub struct IptablesController {
    program: String,
}

impl IptablesController {
    pub fn new() -> Self {
        Self {
            program: "iptables".to_string(),
        }
    }

    /// Use an alternate binary (e.g. `ip6tables`, or a wrapper in a
    /// container image).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn open_args(address: IpAddr, port: u16) -> Vec<String> {
        vec![
            "-I".into(),
            "INPUT".into(),
            "1".into(),
            "-s".into(),
            address.to_string(),
            "-p".into(),
            "tcp".into(),
            "--dport".into(),
            port.to_string(),
            "-j".into(),
            "ACCEPT".into(),
        ]
    }

    fn close_args(address: IpAddr, port: u16) -> Vec<String> {
        vec![
            "-D".into(),
            "INPUT".into(),
            "-s".into(),
            address.to_string(),
            "-p".into(),
            "tcp".into(),
            "--dport".into(),
            port.to_string(),
            "-j".into(),
            "ACCEPT".into(),
        ]
    }

    fn close_all_args(port: u16) -> Vec<String> {
        vec![
            "-I".into(),
            "INPUT".into(),
            "1".into(),
            "-p".into(),
            "tcp".into(),
            "--dport".into(),
            port.to_string(),
            "-j".into(),
            "DROP".into(),
        ]
    }

    async fn run(&self, args: Vec<String>) -> Result<(), FirewallError> {
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .await
            .map_err(|source| FirewallError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(FirewallError::Command {
                program: self.program.clone(),
                status,
            })
        }
    }
}

impl Default for IptablesController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FirewallController for IptablesController {
    async fn open(&self, address: IpAddr, port: u16) -> Result<(), FirewallError> {
        tracing::info!(source = %address, port, "Opening firewall for source");
        self.run(Self::open_args(address, port)).await
    }

    async fn close(&self, address: IpAddr, port: u16) -> Result<(), FirewallError> {
        tracing::info!(source = %address, port, "Closing firewall for source");
        self.run(Self::close_args(address, port)).await
    }

    async fn close_all(&self, port: u16) -> Result<(), FirewallError> {
        tracing::info!(port, "Installing default-deny rule on protected port");
        self.run(Self::close_all_args(port)).await
    }
}

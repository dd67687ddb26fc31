//! Shared utilities for integration testing.

use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use knockgate::firewall::{FirewallController, FirewallError};

/// One recorded firewall invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirewallCall {
    Open(IpAddr, u16),
    Close(IpAddr, u16),
    CloseAll(u16),
}

/// A firewall controller that records calls instead of mutating rules.
#[derive(Default)]
pub struct RecordingFirewall {
    calls: Mutex<Vec<FirewallCall>>,
}

impl RecordingFirewall {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<FirewallCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, FirewallCall::Open(_, _)))
            .count()
    }

    /// Poll until `predicate` holds on the recorded calls, or panic after
    /// `timeout`.
    pub async fn wait_until(
        &self,
        timeout: Duration,
        predicate: impl Fn(&[FirewallCall]) -> bool,
    ) {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if predicate(&self.calls()) {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("firewall never saw expected calls; got {:?}", self.calls());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

#[async_trait]
impl FirewallController for RecordingFirewall {
    async fn open(&self, address: IpAddr, port: u16) -> Result<(), FirewallError> {
        self.calls.lock().unwrap().push(FirewallCall::Open(address, port));
        Ok(())
    }

    async fn close(&self, address: IpAddr, port: u16) -> Result<(), FirewallError> {
        self.calls.lock().unwrap().push(FirewallCall::Close(address, port));
        Ok(())
    }

    async fn close_all(&self, port: u16) -> Result<(), FirewallError> {
        self.calls.lock().unwrap().push(FirewallCall::CloseAll(port));
        Ok(())
    }
}

/// Reserve `n` currently-free UDP ports on `bind`.
pub async fn reserve_udp_ports(bind: IpAddr, n: usize) -> Vec<u16> {
    // Hold every probe until all ports are collected so the OS cannot hand
    // the same port out twice.
    let mut probes = Vec::new();
    for _ in 0..n {
        probes.push(UdpSocket::bind((bind, 0)).await.unwrap());
    }
    probes
        .iter()
        .map(|p| p.local_addr().unwrap().port())
        .collect()
}

/// Reserve one currently-free TCP port on `bind`.
pub async fn reserve_tcp_port(bind: IpAddr) -> u16 {
    let probe = tokio::net::TcpListener::bind((bind, 0)).await.unwrap();
    probe.local_addr().unwrap().port()
}

/// Send one knock datagram to `port` on `target`, from a socket bound to
/// `source`. The payload is arbitrary; the daemon ignores it.
pub async fn knock_from(source: IpAddr, target: IpAddr, port: u16) {
    let sender = UdpSocket::bind((source, 0)).await.unwrap();
    sender.send_to(b"knock", (target, port)).await.unwrap();
}

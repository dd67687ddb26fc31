//! Per-source knock sequence state machine.
//!
//! # States (per source address)
//! - Absent: no live attempt
//! - InProgress: 0 < next_index < N, window running
//!
//! # State Transitions
//! ```text
//! Absent → InProgress: knock matches sequence[0] (window starts here)
//! InProgress → InProgress: knock matches sequence[next_index]
//! InProgress → Absent: mismatch, expiry, or completion
//! ```
//!
//! # Design Decisions
//! - Expiry is checked before matching; a stale record is discarded and the
//!   knock is evaluated as a fresh attempt
//! - Any mismatch wipes progress entirely: no partial credit, no retry of
//!   the same position, so ordering cannot be brute-forced piecewise
//! - The window anchors at the first *matching* knock, not record creation,
//!   so a stray wrong knock never shortens a later genuine attempt

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Why a knock was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The knock hit a port other than the next expected one.
    WrongPort,
    /// The window elapsed before the attempt could complete.
    Expired,
}

/// Outcome of recording one knock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnockOutcome {
    /// The knock advanced an attempt; `position` knocks matched so far.
    Pending { position: usize },
    /// The full sequence matched within the window.
    Completed,
    /// The attempt (if any) was reset.
    Rejected { reason: RejectReason },
}

/// Live progress of one source address through the sequence.
#[derive(Debug, Clone, Copy)]
struct ClientProgress {
    /// Next expected position in the sequence, in [0, N).
    next_index: usize,
    /// When the first matching knock of this attempt arrived.
    window_start: Instant,
}

/// Tracks every in-flight knock attempt, keyed by source address.
///
/// The tracker is purely synchronous and owned by the event loop alone, so
/// arrivals from one address are processed strictly in order and no locking
/// is needed.
pub struct SequenceTracker {
    sequence: Vec<u16>,
    window: Duration,
    progress: HashMap<IpAddr, ClientProgress>,
}

impl SequenceTracker {
    /// Create a tracker for `sequence` with the given completion window.
    ///
    /// The sequence is validated at config load; this assumes it is
    /// non-empty and pairwise distinct.
    pub fn new(sequence: Vec<u16>, window: Duration) -> Self {
        Self {
            sequence,
            window,
            progress: HashMap::new(),
        }
    }

    /// Record one knock from `address` on decoy port `matched_port`.
    ///
    /// Every datagram counts as an independent knock: a duplicated arrival
    /// on the same decoy port is matched against the next expected position
    /// like any other, so a doubled first knock resets the attempt.
    ///
    /// Expiry is strict: an attempt whose age exceeds the window by any
    /// amount is discarded before matching, and the knock in hand is then
    /// treated as the start of a fresh attempt.
    pub fn record_knock(
        &mut self,
        address: IpAddr,
        matched_port: u16,
        now: Instant,
    ) -> KnockOutcome {
        let mut expired = false;

        let mut state = match self.progress.remove(&address) {
            Some(existing) if now.duration_since(existing.window_start) > self.window => {
                tracing::warn!(source = %address, "Sequence took too long to complete, resetting");
                expired = true;
                ClientProgress {
                    next_index: 0,
                    window_start: now,
                }
            }
            Some(existing) => existing,
            None => ClientProgress {
                next_index: 0,
                window_start: now,
            },
        };

        if matched_port != self.sequence[state.next_index] {
            tracing::warn!(
                source = %address,
                port = matched_port,
                expected = self.sequence[state.next_index],
                "Incorrect knock, resetting"
            );
            let reason = if expired {
                RejectReason::Expired
            } else {
                RejectReason::WrongPort
            };
            return KnockOutcome::Rejected { reason };
        }

        if state.next_index == 0 {
            state.window_start = now;
        }
        state.next_index += 1;

        if state.next_index == self.sequence.len() {
            tracing::info!(source = %address, "Knock sequence completed");
            return KnockOutcome::Completed;
        }

        tracing::debug!(
            source = %address,
            position = state.next_index,
            of = self.sequence.len(),
            "Knock sequence advanced"
        );
        self.progress.insert(address, state);
        KnockOutcome::Pending {
            position: state.next_index,
        }
    }

    /// Drop every attempt whose window has elapsed; returns how many were
    /// removed. Run periodically so stalled attempts are cleaned up without
    /// requiring further traffic from the source.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let window = self.window;
        let before = self.progress.len();
        self.progress
            .retain(|address, state| {
                let live = now.duration_since(state.window_start) <= window;
                if !live {
                    tracing::debug!(source = %address, "Expired attempt swept");
                }
                live
            });
        before - self.progress.len()
    }

    /// Number of addresses with a live attempt.
    pub fn tracked(&self) -> usize {
        self.progress.len()
    }

    /// The decoy sequence this tracker matches against.
    pub fn sequence(&self) -> &[u16] {
        &self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6));

    fn tracker() -> SequenceTracker {
        SequenceTracker::new(vec![1234, 5678, 9012], Duration::from_secs(10))
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_exact_sequence_in_window_completes() {
        // Knocks at t=0, t=3, t=9 with a 10s window.
        let mut t = tracker();
        let t0 = Instant::now();

        assert_eq!(
            t.record_knock(ADDR, 1234, t0),
            KnockOutcome::Pending { position: 1 }
        );
        assert_eq!(
            t.record_knock(ADDR, 5678, t0 + secs(3.0)),
            KnockOutcome::Pending { position: 2 }
        );
        assert_eq!(t.record_knock(ADDR, 9012, t0 + secs(9.0)), KnockOutcome::Completed);
        // Progress removed synchronously on success.
        assert_eq!(t.tracked(), 0);
    }

    #[test]
    fn test_skipped_position_resets_immediately() {
        // 1234 at t=0, then 9012 at t=1 skipping 5678.
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        assert_eq!(
            t.record_knock(ADDR, 9012, t0 + secs(1.0)),
            KnockOutcome::Rejected {
                reason: RejectReason::WrongPort
            }
        );
        assert_eq!(t.tracked(), 0);

        // The address can restart immediately with a fresh attempt.
        assert_eq!(
            t.record_knock(ADDR, 1234, t0 + secs(1.5)),
            KnockOutcome::Pending { position: 1 }
        );
    }

    #[test]
    fn test_out_of_order_first_knock_rejected_without_state() {
        let mut t = tracker();
        let t0 = Instant::now();

        assert_eq!(
            t.record_knock(ADDR, 5678, t0),
            KnockOutcome::Rejected {
                reason: RejectReason::WrongPort
            }
        );
        assert_eq!(t.tracked(), 0);
    }

    #[test]
    fn test_final_knock_just_past_window_expires() {
        // Boundary is strictly-greater: exactly window is still in time,
        // any epsilon past it is not.
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        t.record_knock(ADDR, 5678, t0 + secs(3.0));
        assert_eq!(
            t.record_knock(ADDR, 9012, t0 + secs(10.0) + Duration::from_nanos(1)),
            KnockOutcome::Rejected {
                reason: RejectReason::Expired
            }
        );
        assert_eq!(t.tracked(), 0);
    }

    #[test]
    fn test_final_knock_exactly_at_window_completes() {
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        t.record_knock(ADDR, 5678, t0 + secs(3.0));
        assert_eq!(t.record_knock(ADDR, 9012, t0 + secs(10.0)), KnockOutcome::Completed);
    }

    #[test]
    fn test_expired_attempt_allows_immediate_restart() {
        // Third knock at t=11 with window=10 expires the
        // attempt; a fresh start at port 1234 works right away.
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        t.record_knock(ADDR, 5678, t0 + secs(3.0));
        assert_eq!(
            t.record_knock(ADDR, 9012, t0 + secs(11.0)),
            KnockOutcome::Rejected {
                reason: RejectReason::Expired
            }
        );
        assert_eq!(
            t.record_knock(ADDR, 1234, t0 + secs(11.0)),
            KnockOutcome::Pending { position: 1 }
        );
    }

    #[test]
    fn test_expired_record_restarts_on_first_port() {
        // A stale record hit by the true first knock starts a new attempt
        // in the same call. Window anchors at this knock.
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        assert_eq!(
            t.record_knock(ADDR, 1234, t0 + secs(20.0)),
            KnockOutcome::Pending { position: 1 }
        );
        // Full window available from the restart.
        assert_eq!(
            t.record_knock(ADDR, 5678, t0 + secs(29.0)),
            KnockOutcome::Pending { position: 2 }
        );
    }

    #[test]
    fn test_window_anchors_at_first_matching_knock() {
        // A stray wrong knock followed later by the true first knock still
        // gets a full window.
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 9012, t0);
        t.record_knock(ADDR, 1234, t0 + secs(8.0));
        t.record_knock(ADDR, 5678, t0 + secs(12.0));
        // 9.9s after the anchoring knock, well inside the window.
        assert_eq!(
            t.record_knock(ADDR, 9012, t0 + secs(17.9)),
            KnockOutcome::Completed
        );
    }

    #[test]
    fn test_interleaved_addresses_progress_independently() {
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        t.record_knock(OTHER, 1234, t0 + secs(0.5));
        t.record_knock(ADDR, 5678, t0 + secs(1.0));
        // OTHER mismatching has no effect on ADDR.
        t.record_knock(OTHER, 9012, t0 + secs(1.5));
        assert_eq!(
            t.record_knock(ADDR, 9012, t0 + secs(2.0)),
            KnockOutcome::Completed
        );

        // OTHER was reset and can complete on its own.
        t.record_knock(OTHER, 1234, t0 + secs(3.0));
        t.record_knock(OTHER, 5678, t0 + secs(4.0));
        assert_eq!(
            t.record_knock(OTHER, 9012, t0 + secs(5.0)),
            KnockOutcome::Completed
        );
    }

    #[test]
    fn test_duplicate_knock_counts_as_independent() {
        // Documented policy: each datagram is its own knock, so a doubled
        // first knock mismatches position 1 and resets.
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        assert_eq!(
            t.record_knock(ADDR, 1234, t0 + secs(0.01)),
            KnockOutcome::Rejected {
                reason: RejectReason::WrongPort
            }
        );
    }

    #[test]
    fn test_sweep_removes_stalled_attempts_only() {
        let mut t = tracker();
        let t0 = Instant::now();

        t.record_knock(ADDR, 1234, t0);
        t.record_knock(OTHER, 1234, t0 + secs(8.0));
        assert_eq!(t.tracked(), 2);

        // ADDR is past its window, OTHER is not.
        assert_eq!(t.sweep_expired(t0 + secs(10.5)), 1);
        assert_eq!(t.tracked(), 1);

        assert_eq!(
            t.record_knock(OTHER, 5678, t0 + secs(11.0)),
            KnockOutcome::Pending { position: 2 }
        );
    }

    #[test]
    fn test_single_port_sequence_completes_on_one_knock() {
        let mut t = SequenceTracker::new(vec![4242], Duration::from_secs(10));
        assert_eq!(
            t.record_knock(ADDR, 4242, Instant::now()),
            KnockOutcome::Completed
        );
        assert_eq!(t.tracked(), 0);
    }

    #[test]
    fn test_second_full_sequence_completes_again() {
        // Completion removes progress, so a repeat run is a fresh attempt.
        let mut t = tracker();
        let t0 = Instant::now();

        for (i, &port) in [1234u16, 5678, 9012].iter().enumerate() {
            t.record_knock(ADDR, port, t0 + secs(i as f64));
        }
        t.record_knock(ADDR, 1234, t0 + secs(20.0));
        t.record_knock(ADDR, 5678, t0 + secs(21.0));
        assert_eq!(
            t.record_knock(ADDR, 9012, t0 + secs(22.0)),
            KnockOutcome::Completed
        );
    }
}

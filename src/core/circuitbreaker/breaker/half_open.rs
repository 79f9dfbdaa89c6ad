use std::sync::atomic::{AtomicU32, Ordering};

/// The decision taken after a probe result arrives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// not enough successful probes yet
    Pending,
    /// the resource has recovered
    Close,
    /// a probe failed
    Reopen,
}

/// `HalfOpenProbe` bounds the trial requests admitted in half-open state,
/// and tracks the consecutive successes among their results.
#[derive(Debug)]
pub struct HalfOpenProbe {
    max_requests: u32,
    consecutive_success: u32,
    in_flight: AtomicU32,
    successes: AtomicU32,
}

impl HalfOpenProbe {
    pub fn new(max_requests: u32, consecutive_success: u32) -> Self {
        HalfOpenProbe {
            max_requests,
            consecutive_success,
            in_flight: AtomicU32::new(0),
            successes: AtomicU32::new(0),
        }
    }

    /// `try_acquire` admits a probe only if fewer than `max_requests` probes are in flight.
    /// The check and the increment are a single atomic step,
    /// concurrent callers can never overshoot the bound.
    pub fn try_acquire(&self) -> bool {
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n < self.max_requests {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// `on_probe_result` releases the slot of a finished probe and decides on the circuit.
    pub fn on_probe_result(&self, success: bool) -> ProbeVerdict {
        self.release();
        if !success {
            return ProbeVerdict::Reopen;
        }
        let successes = self.successes.fetch_add(1, Ordering::SeqCst) + 1;
        if successes >= self.consecutive_success {
            ProbeVerdict::Close
        } else {
            ProbeVerdict::Pending
        }
    }

    /// `release` gives back the slot of an admitted probe that was never sent.
    pub(crate) fn release(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// `release_all` frees every slot, the probes holding them are considered lost.
    pub fn release_all(&self) {
        self.in_flight.store(0, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.in_flight.store(0, Ordering::SeqCst);
        self.successes.store(0, Ordering::SeqCst);
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotone send/receive byte counters for one channel, per spec §5 "Byte
/// accounting".
#[derive(Debug, Default)]
pub struct Counters {
    sent: AtomicU64,
    received: AtomicU64,
}

impl Counters {
    pub fn add_sent(&self, n: u64) {
        self.sent.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_received(&self, n: u64) {
        self.received.fetch_add(n, Ordering::Relaxed);
    }

    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

/// A point-in-time snapshot of one peer's counters plus a wall-clock
/// (monotonic) millisecond stamp. Two snapshots subtract to yield
/// `{time, communication}` as spec §5 describes; used as the oracle for the
/// byte-exact accounting properties in spec §8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsPoint {
    pub sent: u64,
    pub received: u64,
    pub millis: u128,
}

impl StatsPoint {
    #[must_use]
    pub fn capture(counters: &Counters, epoch: Instant) -> Self {
        StatsPoint {
            sent: counters.sent(),
            received: counters.received(),
            millis: epoch.elapsed().as_millis(),
        }
    }

    /// `self - earlier`: bytes sent/received and time elapsed between two
    /// snapshots of the same counters.
    #[must_use]
    pub fn since(&self, earlier: &StatsPoint) -> StatsPoint {
        StatsPoint {
            sent: self.sent.saturating_sub(earlier.sent),
            received: self.received.saturating_sub(earlier.received),
            millis: self.millis.saturating_sub(earlier.millis),
        }
    }
}

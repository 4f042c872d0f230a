use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fixed starting point so scenario timestamps are reproducible.
const EPOCH: i64 = 1_700_000_000;

/// Controllable time for repository timestamps.
///
/// Records added or updated by a scenario get their `updated_at` from this
/// clock, which makes the ranking tie-break and change detection testable.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<AtomicI64>,
}

impl MockClock {
    /// Create a new mock clock at the fixed epoch
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicI64::new(EPOCH)),
        }
    }

    /// Get current timestamp
    pub fn now(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Advance time by duration
    pub fn advance(&self, duration: Duration) {
        let seconds = duration.as_secs() as i64;
        self.current.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Advance time by one second and return the new timestamp
    pub fn tick(&self) -> i64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Advance time by days
    pub fn advance_days(&self, days: u64) {
        self.advance(Duration::from_secs(days * 86400));
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

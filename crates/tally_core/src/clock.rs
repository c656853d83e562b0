//! Time source used for entity stamping and timer transitions.
//!
//! All timestamps in the core are Unix epoch milliseconds.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch-millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Manually advanced clock.
///
/// Clones share the same instant, so a test can keep one handle while the
/// context owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn starting_at(epoch_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(epoch_ms)),
        }
    }

    pub fn set(&self, epoch_ms: i64) {
        self.now_ms.store(epoch_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, delta_secs: i64) {
        self.advance_ms(delta_secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock, SystemClock};

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(1_000);
        let handle = clock.clone();
        handle.advance_secs(2);
        assert_eq!(clock.now_ms(), 3_000);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now_ms() > 0);
    }
}

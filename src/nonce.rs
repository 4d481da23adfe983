//! Process-local nonce source.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::Rng as _;

/// Hands out strictly increasing nonces derived from the wall clock in microseconds.
///
/// Each value is `max(now_us, previous + 1)`, so a clock step backwards or a burst
/// inside one microsecond still yields distinct values. The starting point is
/// offset by a random sub-millisecond amount so two processes started together
/// for the same account are unlikely to collide. Uniqueness across processes is
/// not guaranteed; callers sharing an account across processes must coordinate.
#[derive(Debug)]
pub struct NonceGenerator {
    last: AtomicU64,
}

impl NonceGenerator {
    #[must_use]
    pub fn new() -> Self {
        let jitter = rand::rng().random_range(0..1_000);
        Self {
            last: AtomicU64::new(now_micros().saturating_add(jitter)),
        }
    }

    pub fn next(&self) -> u64 {
        let now = now_micros();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn now_micros() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default()
}

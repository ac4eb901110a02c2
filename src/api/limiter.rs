//! Token-bucket rate limiting for outbound API calls.
//!
//! One `RateLimiter` is shared by every request in an audit run; it is the
//! only mechanism enforcing the remote service's requests-per-second
//! ceiling. The bucket accrues fractional tokens at a fixed rate up to a
//! burst capacity, and `acquire` suspends the caller until a whole token
//! can be deducted.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Smoothing delay applied after every admission, so a full bucket cannot
/// release a burst faster than the remote service absorbs it.
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, rate: f64, capacity: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Shared token-bucket admission gate.
///
/// `acquire` never rejects; it always eventually admits. Refill-then-deduct
/// happens under one lock so concurrent callers cannot double-spend a refill
/// or drive the bucket negative. Waiters queue on the lock and are admitted
/// one at a time.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    pacing: Duration,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Bucket with `rate` tokens/second, a burst cap of `capacity`, and the
    /// default pacing delay. The bucket starts full.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self::with_pacing(rate, capacity, DEFAULT_PACING)
    }

    /// Bucket with an explicit pacing delay; `Duration::ZERO` disables
    /// smoothing entirely.
    pub fn with_pacing(rate: f64, capacity: f64, pacing: Duration) -> Self {
        debug_assert!(rate > 0.0, "refill rate must be positive");
        debug_assert!(capacity >= 1.0, "capacity must admit at least one call");
        Self {
            rate,
            capacity,
            pacing,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Block until a token is available, then deduct it.
    ///
    /// The pacing delay elapses while the lock is held, so a burst of ready
    /// callers still drains at most one admission per pacing interval.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        state.refill(self.rate, self.capacity);

        if state.tokens < 1.0 {
            let wait = Duration::from_secs_f64((1.0 - state.tokens) / self.rate);
            sleep(wait).await;
            state.refill(self.rate, self.capacity);
        }

        // Guard against float drift leaving the bucket fractionally short
        state.tokens = (state.tokens - 1.0).max(0.0);

        if !self.pacing.is_zero() {
            sleep(self.pacing).await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn available(&self) -> f64 {
        self.state.lock().await.tokens
    }
}

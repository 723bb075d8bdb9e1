//! Token-bucket request-rate limiting, one bucket per model.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Classic token bucket: `burst` capacity, refilled at `rate_per_sec`.
///
/// `acquire` is a suspension point; callers sleep until a token is available.
/// One bucket is shared by every expert using the same model.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    rate_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(rate_per_sec: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            capacity,
            rate_per_sec: rate_per_sec.max(f64::MIN_POSITIVE),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill);
                state.tokens =
                    (state.tokens + elapsed.as_secs_f64() * self.rate_per_sec).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate_per_sec)
            };
            trace!(wait_ms = wait.as_millis() as u64, "rate limiter backoff");
            tokio::time::sleep(wait).await;
        }
    }
}

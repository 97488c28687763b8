//! Process-wide request rate limiter.
//!
//! Every remote call acquires a slot before it is sent. Slots are spaced
//! `1 / requests_per_second` apart; a caller reserves the next free slot
//! under the lock and then sleeps until it arrives, so concurrent callers
//! queue up instead of bursting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Configuration for the rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sustained request budget.
    pub requests_per_second: u32,
}

impl RateLimitConfig {
    /// Minimum spacing between two requests.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(1) / self.requests_per_second.max(1)
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    next_slot: Option<Instant>,
    total_requests: u64,
}

/// Shared rate limiter. Cloning shares the underlying state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<LimiterState>>,
}

impl RateLimiter {
    /// Create a new rate limiter with custom config.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(LimiterState::default())),
        }
    }

    /// Wait until a request slot is available and claim it.
    pub async fn acquire(&self) {
        let wait_time = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let slot = match state.next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            state.next_slot = Some(slot + self.config.interval());
            state.total_requests += 1;
            slot - now
        };

        if wait_time > Duration::ZERO {
            debug!("Rate limiting: waiting {:?}", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Number of slots handed out so far.
    pub async fn total_requests(&self) -> u64 {
        self.state.lock().await.total_requests
    }
}

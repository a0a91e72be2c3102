//! Rate Governor — bounds outbound model calls to a fixed number per
//! rolling window.
//!
//! Every slot refills at once when the window rolls over, so admission is
//! bursty right after a reset. `acquire` never rejects, it only delays;
//! starvation between callers is not prevented (no priority, no fairness
//! contract). The sleep happens outside the lock so waiting callers do not
//! block anyone else's bookkeeping.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Process-wide reservation gate for the generative-model service.
pub struct RateGovernor {
    limit: u32,
    window: Duration,
    state: Mutex<RateWindow>,
}

impl RateGovernor {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(RateWindow {
                count: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Reserves one model-call slot, suspending until the window has
    /// capacity. Always eventually succeeds.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                if now.duration_since(state.window_start) >= self.window {
                    state.window_start = now;
                    state.count = 0;
                }
                if state.count < self.limit {
                    state.count += 1;
                    return;
                }
                self.window - now.duration_since(state.window_start)
            };
            debug!(?wait, "model-call window exhausted; waiting for reset");
            sleep(wait).await;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_calls_within_limit_are_not_delayed() {
        let governor = RateGovernor::new(3, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..3 {
            governor.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_past_limit_waits_for_window_reset() {
        let governor = RateGovernor::new(2, Duration::from_secs(60));
        let start = Instant::now();
        governor.acquire().await;
        governor.acquire().await;
        // Third call must suspend until the window rolls over, never error.
        governor.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reset_refills_all_slots() {
        let governor = RateGovernor::new(2, Duration::from_secs(60));
        governor.acquire().await;
        governor.acquire().await;

        tokio::time::advance(Duration::from_secs(61)).await;

        // A fresh window admits the full burst again without waiting.
        let start = Instant::now();
        governor.acquire().await;
        governor.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_all_eventually_admitted() {
        let governor = std::sync::Arc::new(RateGovernor::new(1, Duration::from_secs(10)));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let g = governor.clone();
            handles.push(tokio::spawn(async move { g.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}

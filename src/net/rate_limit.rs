//! Sliding-log rate limiter for upstream request pacing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Caps requests at `max_requests` per rolling `window`.
///
/// `throttle` suspends the caller until the oldest tracked request falls
/// outside the window, then records the new attempt - requests are delayed,
/// never rejected. Each client instance is independent; there is no
/// cross-process coordination.
pub struct RateLimiter {
  max_requests: usize,
  window: Duration,
  log: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
  pub fn new(max_requests: usize, window: Duration) -> Self {
    Self {
      max_requests: max_requests.max(1),
      window,
      log: Mutex::new(VecDeque::new()),
    }
  }

  /// Wait for a request slot, then claim it.
  pub async fn throttle(&self) {
    loop {
      let wait = {
        let mut log = self.lock();
        let now = Instant::now();
        while log
          .front()
          .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
          log.pop_front();
        }

        if log.len() < self.max_requests {
          log.push_back(now);
          None
        } else {
          log
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
        }
      };

      match wait {
        None => return,
        Some(delay) => {
          tracing::debug!(?delay, "rate limit reached, waiting for a slot");
          tokio::time::sleep(delay).await;
        }
      }
    }
  }

  fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
    self.log.lock().unwrap_or_else(|e| e.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_allows_burst_up_to_limit() {
    let limiter = RateLimiter::new(10, Duration::from_secs(60));

    let start = Instant::now();
    for _ in 0..10 {
      limiter.throttle().await;
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn test_eleventh_call_waits_for_window() {
    let limiter = RateLimiter::new(10, Duration::from_secs(60));

    for _ in 0..10 {
      limiter.throttle().await;
    }

    // The 11th call is delayed until the oldest request expires, not
    // rejected.
    let start = Instant::now();
    limiter.throttle().await;
    assert!(start.elapsed() >= Duration::from_secs(60));
  }

  #[tokio::test(start_paused = true)]
  async fn test_slot_frees_after_window_passes() {
    let limiter = RateLimiter::new(10, Duration::from_secs(60));

    for _ in 0..10 {
      limiter.throttle().await;
    }
    tokio::time::advance(Duration::from_secs(61)).await;

    let start = Instant::now();
    limiter.throttle().await;
    assert_eq!(start.elapsed(), Duration::ZERO);
  }
}

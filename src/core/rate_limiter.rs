use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

pub const DEFAULT_MAX_REQUESTS_PER_MINUTE: usize = 250;
const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter shared by every outbound request.
///
/// At most `max_requests` callers are released in any trailing `period`.
/// A caller that would exceed the cap sleeps while holding the window lock,
/// so later callers queue behind it. Nothing is ever rejected.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests_per_minute: usize) -> Self {
        Self::with_period(max_requests_per_minute, WINDOW)
    }

    pub fn with_period(max_requests: usize, period: Duration) -> Self {
        Self {
            max_requests,
            period,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Waits until one more request fits in the window, then records it.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        let mut now = Instant::now();
        Self::evict(&mut window, now, self.period);

        if window.len() >= self.max_requests {
            if let Some(&oldest) = window.front() {
                let release_at = oldest + self.period;
                tracing::info!(
                    "⏳ Rate limit reached ({} requests per {:?}). Sleeping {:.2}s...",
                    self.max_requests,
                    self.period,
                    release_at.saturating_duration_since(now).as_secs_f64()
                );
                sleep_until(release_at).await;
                now = Instant::now();
                Self::evict(&mut window, now, self.period);
            }
        }

        window.push_back(now);
    }

    /// Requests recorded in the current window.
    pub async fn in_window(&self) -> usize {
        let mut window = self.window.lock().await;
        Self::evict(&mut window, Instant::now(), self.period);
        window.len()
    }

    fn evict(window: &mut VecDeque<Instant>, now: Instant, period: Duration) {
        while let Some(&front) = window.front() {
            if now.duration_since(front) >= period {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS_PER_MINUTE)
    }
}

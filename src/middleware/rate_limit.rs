use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::sleep;

use crate::errors::ApiError;
use crate::middleware::client_key;
use crate::state::AppState;

/// Request count for one client inside its current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// Fixed-window, per-client request counter.
///
/// Entries are created lazily and only removed by `sweep`, which runs
/// inline on a random fraction of requests and from `cleanup_loop`.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    sweep_probability: f64,
    entries: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32, sweep_probability: f64) -> Self {
        Self {
            window,
            max_requests,
            sweep_probability,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request from `key` at `now`.
    pub fn check(&self, key: &str, now: Instant) -> RateDecision {
        let mut entries = self.lock();

        let decision = match entries.get_mut(key) {
            None => {
                entries.insert(key.to_string(), Window { count: 1, started: now });
                RateDecision::Allowed
            }
            Some(w) if now.saturating_duration_since(w.started) > self.window => {
                w.count = 1;
                w.started = now;
                RateDecision::Allowed
            }
            Some(w) => {
                w.count = w.count.saturating_add(1);
                if w.count > self.max_requests {
                    RateDecision::Limited {
                        retry_after: (w.started + self.window).saturating_duration_since(now),
                    }
                } else {
                    RateDecision::Allowed
                }
            }
        };

        if self.sweep_probability > 0.0 && rand::random::<f64>() < self.sweep_probability {
            self.sweep_locked(&mut entries, now);
        }

        decision
    }

    /// Drop every entry whose window has expired. Returns how many went.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        self.sweep_locked(&mut entries, now)
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    fn sweep_locked(&self, entries: &mut HashMap<String, Window>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, w| now.saturating_duration_since(w.started) <= self.window);
        let removed = before - entries.len();

        if removed > 0 {
            tracing::debug!(
                "Rate limiter sweep: removed {} expired entries ({} remaining)",
                removed,
                entries.len()
            );
        }
        removed
    }

    // Counters stay meaningful even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Middleware: reject the request with 429 once its client is over the
/// limit, otherwise pass it on.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);

    match state.rate_limiter.check(&key, Instant::now()) {
        RateDecision::Allowed => Ok(next.run(request).await),
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %key, "Rate limit exceeded");
            Err(ApiError::RateLimited {
                retry_after_secs: ceil_secs(retry_after),
            })
        }
    }
}

/// Background task that periodically sweeps expired entries.
pub async fn cleanup_loop(limiter: Arc<RateLimiter>, every: Duration) {
    loop {
        sleep(every).await;
        limiter.sweep(Instant::now());
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let millis = d.as_millis() as u64;
    millis.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(900);

    fn limiter(max: u32) -> RateLimiter {
        RateLimiter::new(WINDOW, max, 0.0)
    }

    #[test]
    fn rejects_once_over_the_limit() {
        let rl = limiter(3);
        let t0 = Instant::now();

        for _ in 0..3 {
            assert_eq!(rl.check("10.0.0.1", t0), RateDecision::Allowed);
        }
        assert!(matches!(rl.check("10.0.0.1", t0), RateDecision::Limited { .. }));
        assert!(matches!(rl.check("10.0.0.1", t0), RateDecision::Limited { .. }));
    }

    #[test]
    fn clients_are_counted_separately() {
        let rl = limiter(1);
        let t0 = Instant::now();

        assert_eq!(rl.check("a", t0), RateDecision::Allowed);
        assert!(matches!(rl.check("a", t0), RateDecision::Limited { .. }));
        assert_eq!(rl.check("b", t0), RateDecision::Allowed);
        assert_eq!(rl.tracked_clients(), 2);
    }

    #[test]
    fn new_window_after_expiry() {
        let rl = limiter(2);
        let t0 = Instant::now();

        rl.check("a", t0);
        rl.check("a", t0);
        assert!(matches!(rl.check("a", t0), RateDecision::Limited { .. }));

        // Exactly at the boundary the old window still applies.
        assert!(matches!(rl.check("a", t0 + WINDOW), RateDecision::Limited { .. }));

        let later = t0 + WINDOW + Duration::from_millis(1);
        assert_eq!(rl.check("a", later), RateDecision::Allowed);
        assert_eq!(rl.check("a", later), RateDecision::Allowed);
    }

    #[test]
    fn retry_after_is_time_left_in_window() {
        let rl = limiter(1);
        let t0 = Instant::now();

        rl.check("a", t0);
        let decision = rl.check("a", t0 + Duration::from_secs(100));

        assert_eq!(
            decision,
            RateDecision::Limited {
                retry_after: Duration::from_secs(800)
            }
        );
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let rl = limiter(10);
        let t0 = Instant::now();

        rl.check("old", t0);
        rl.check("fresh", t0 + Duration::from_secs(600));

        assert_eq!(rl.sweep(t0 + WINDOW + Duration::from_secs(1)), 1);
        assert_eq!(rl.tracked_clients(), 1);
    }

    #[test]
    fn certain_sweep_runs_inline() {
        let rl = RateLimiter::new(WINDOW, 10, 1.0);
        let t0 = Instant::now();

        rl.check("old", t0);
        rl.check("new", t0 + WINDOW + Duration::from_secs(1));

        assert_eq!(rl.tracked_clients(), 1);
    }

    #[test]
    fn ceil_secs_rounds_up() {
        assert_eq!(ceil_secs(Duration::from_millis(0)), 0);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1000)), 1);
        assert_eq!(ceil_secs(Duration::from_millis(1001)), 2);
    }
}

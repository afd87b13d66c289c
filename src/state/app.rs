use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::colaboradores::ColaboradorStore;

/// Everything a request handler or middleware can reach.
///
/// Cloned per request; all members are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub store: ColaboradorStore,
    pub config: Arc<AppConfig>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_store(config, ColaboradorStore::new())
    }

    pub fn with_store(config: AppConfig, store: ColaboradorStore) -> Self {
        let rate_limiter = RateLimiter::new(
            Duration::from_secs(config.rate_limit.window_seconds),
            config.rate_limit.max_requests,
            config.rate_limit.sweep_probability,
        );

        Self {
            store,
            config: Arc::new(config),
            rate_limiter: Arc::new(rate_limiter),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

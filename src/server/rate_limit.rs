use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use http::{header::RETRY_AFTER, HeaderValue, StatusCode};
use tracing::debug;

use crate::config::settings::LimitConfig;
use crate::helpers::time::{saturating_add, to_chrono, Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::server::error::proxy_error;
use crate::utils::constants::ERR_RATE_LIMITED;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    used: u32,
}

/// Fixed-window limiter keyed by remote address: `limit` requests per
/// `period`, with the full allowance restored when a window ends.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    limit: u32,
    period: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &LimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &LimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            limit: config.token,
            period: to_chrono(std::time::Duration::from_secs(config.period_seconds)),
            clock,
        }
    }

    /// Counts one request for `key`. `Err` carries the seconds until the
    /// window resets.
    pub fn check(&self, key: &str) -> Result<(), i64> {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(key.to_owned()).or_insert(Window {
            started_at: now,
            used: 0,
        });

        if now - window.started_at >= self.period {
            *window = Window {
                started_at: now,
                used: 0,
            };
        }

        if window.used >= self.limit {
            let retry_after = (saturating_add(window.started_at, self.period) - now).num_seconds().max(1);
            return Err(retry_after);
        }
        window.used += 1;
        Ok(())
    }

    /// Drops windows that have ended.
    pub fn purge_stale(&self) -> usize {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, w| now - w.started_at < self.period);
        before - windows.len()
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Middleware for `axum::middleware::from_fn_with_state`.
pub async fn limit_requests(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let key = client_key(&request);
    match limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            debug!(client = %key, retry_after, "rate limit exceeded");
            if let Ok(metrics) = get_metrics().await {
                metrics.rate_limited.inc();
            }
            let mut response = proxy_error(
                StatusCode::TOO_MANY_REQUESTS,
                ERR_RATE_LIMITED,
                "API call limit exceeded",
            );
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::time::ManualClock;

    fn limiter(token: u32, period_seconds: u64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let config = LimitConfig { token, period_seconds };
        (RateLimiter::with_clock(&config, clock.clone()), clock)
    }

    #[test]
    fn allows_limit_then_refuses_until_window_ends() {
        let (limiter, clock) = limiter(3, 300);
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        assert_eq!(limiter.check("10.0.0.1"), Err(300));

        clock.advance(Duration::seconds(200));
        assert_eq!(limiter.check("10.0.0.1"), Err(100));

        clock.advance(Duration::seconds(100));
        assert!(limiter.check("10.0.0.1").is_ok());
    }

    #[test]
    fn keys_are_independent() {
        let (limiter, _) = limiter(1, 60);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());
        assert!(limiter.check("b").is_ok());
    }

    #[test]
    fn purge_drops_finished_windows() {
        let (limiter, clock) = limiter(1, 60);
        limiter.check("a").unwrap();
        clock.advance(Duration::seconds(30));
        limiter.check("b").unwrap();
        clock.advance(Duration::seconds(31));
        assert_eq!(limiter.purge_stale(), 1);
    }

    #[test]
    fn huge_period_refuses_without_overflow() {
        let (limiter, clock) = limiter(1, u64::MAX);
        assert!(limiter.check("a").is_ok());
        let retry_after = limiter.check("a").unwrap_err();
        assert!(retry_after > 0);

        clock.advance(Duration::days(3650));
        assert!(limiter.check("a").is_err());
        assert_eq!(limiter.purge_stale(), 0);
    }
}

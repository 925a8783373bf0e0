use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

use crate::config::AppState;
use crate::utils::api_response::ResponseBuilder;

/// Sliding-window counter shared across endpoints. Scoped keys let different
/// routes carry different budgets (registration per IP, comments per user, ...)
/// on top of the global per-IP ceiling applied by the middleware.
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Global budget check (used by the middleware).
    pub async fn check_rate_limit(&self, identifier: &str) -> bool {
        self.check_scoped("global", identifier, self.max_requests, self.window)
            .await
    }

    /// Per-endpoint budget check. Returns false when the caller is over.
    pub async fn check_scoped(
        &self,
        scope: &str,
        identifier: &str,
        max_requests: usize,
        window: Duration,
    ) -> bool {
        let key = format!("{}:{}", scope, identifier);
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        // Lazy cleanup of entries older than the window.
        let cutoff = now.checked_sub(window).unwrap_or(now);
        let entry = requests.entry(key).or_insert_with(Vec::new);
        entry.retain(|&timestamp| timestamp > cutoff);

        if entry.len() >= max_requests {
            return false;
        }

        entry.push(now);
        true
    }
}

/// Best-effort client address. Behind a proxy the first X-Forwarded-For hop
/// is what we get; otherwise callers collapse into "unknown".
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim())
        .unwrap_or("unknown")
        .to_string()
}

pub fn throttled() -> Response {
    ResponseBuilder::error::<()>(
        StatusCode::TOO_MANY_REQUESTS,
        "RATE_LIMIT_EXCEEDED",
        "Too many requests. Please try again later.",
    )
    .into_response()
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = client_ip(request.headers());

    if !state.rate_limiter.check_rate_limit(&identifier).await {
        return throttled();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scoped_budget_fills_up() {
        let limiter = RateLimiter::new(100, Duration::from_secs(60));

        for _ in 0..5 {
            assert!(
                limiter
                    .check_scoped("register", "1.2.3.4", 5, Duration::from_secs(60))
                    .await
            );
        }
        assert!(
            !limiter
                .check_scoped("register", "1.2.3.4", 5, Duration::from_secs(60))
                .await
        );
    }

    #[tokio::test]
    async fn scopes_and_identifiers_are_independent() {
        let limiter = RateLimiter::new(100, Duration::from_secs(60));

        assert!(limiter.check_scoped("a", "x", 1, Duration::from_secs(60)).await);
        assert!(!limiter.check_scoped("a", "x", 1, Duration::from_secs(60)).await);

        // Different identifier, same scope.
        assert!(limiter.check_scoped("a", "y", 1, Duration::from_secs(60)).await);
        // Same identifier, different scope.
        assert!(limiter.check_scoped("b", "x", 1, Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn window_expiry_frees_the_budget() {
        let limiter = RateLimiter::new(100, Duration::from_secs(60));
        let window = Duration::from_millis(20);

        assert!(limiter.check_scoped("s", "x", 1, window).await);
        assert!(!limiter.check_scoped("s", "x", 1, window).await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check_scoped("s", "x", 1, window).await);
    }

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.0.0.1");
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}

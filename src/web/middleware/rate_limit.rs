//! Per-IP rate limiting for uploads.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Rate limiter for a single client IP.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Upload rate limits keyed by client IP.
pub struct UploadRateLimiter {
    limiters: RwLock<HashMap<String, Arc<IpRateLimiter>>>,
    quota: Quota,
}

impl UploadRateLimiter {
    /// Allow `uploads_per_minute` uploads per client IP (at least one).
    pub fn new(uploads_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            quota: Quota::per_minute(NonZeroU32::new(uploads_per_minute).unwrap_or(NonZeroU32::MIN)),
        }
    }

    fn limiter_for(&self, ip: &str) -> Arc<IpRateLimiter> {
        {
            let read_guard = self.limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = self.limiters.write().unwrap_or_else(|e| e.into_inner());
        write_guard
            .entry(ip.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone()
    }

    /// Record an upload attempt; returns `false` when over the limit.
    pub fn check(&self, ip: &str) -> bool {
        self.limiter_for(ip).check().is_ok()
    }

    /// Number of tracked client IPs.
    pub fn tracked_clients(&self) -> usize {
        self.limiters.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop limiters that are not currently borrowed by a request.
    ///
    /// A client whose limiter was dropped starts with a fresh quota.
    pub fn cleanup(&self) {
        let mut guard = self.limiters.write().unwrap_or_else(|e| e.into_inner());
        guard.retain(|_, v| Arc::strong_count(v) > 1);
    }

    /// Start a background task that calls [`cleanup`](Self::cleanup) every 5 minutes.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            // Skip the first immediate tick
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Extract the client IP, preferring reverse proxy headers.
fn client_ip(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for the upload endpoint.
pub async fn upload_rate_limit(
    limiter: Arc<UploadRateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if !limiter.check(&ip) {
        tracing::warn!(ip = %ip, "Upload rate limit exceeded");
        return ApiError::too_many_requests("Too many uploads. Please try again later.")
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_rate_limit() {
        let limiter = UploadRateLimiter::new(3);

        assert!(limiter.check("127.0.0.1"));
        assert!(limiter.check("127.0.0.1"));
        assert!(limiter.check("127.0.0.1"));
        assert!(!limiter.check("127.0.0.1"));

        // Different IP has its own quota
        assert!(limiter.check("192.168.1.1"));
    }

    #[test]
    fn test_zero_means_one() {
        let limiter = UploadRateLimiter::new(0);

        assert!(limiter.check("127.0.0.1"));
        assert!(!limiter.check("127.0.0.1"));
    }

    #[test]
    fn test_cleanup_drops_idle_limiters() {
        let limiter = UploadRateLimiter::new(1);

        limiter.check("10.0.0.1");
        limiter.check("10.0.0.2");
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.cleanup();
        assert_eq!(limiter.tracked_clients(), 0);

        // Quota starts over after cleanup
        assert!(limiter.check("10.0.0.1"));
    }

    #[test]
    fn test_client_ip_headers() {
        let req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "203.0.113.7");

        let req = Request::builder()
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "198.51.100.2");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), "unknown");
    }
}

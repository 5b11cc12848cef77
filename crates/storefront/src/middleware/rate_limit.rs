//! Rate limiting.
//!
//! Two limiters with different jobs:
//! - [`FixedWindowLimiter`]: per-client budget for abuse-prone form endpoints
//!   (newsletter: 5 requests per 10 minutes). Checked inside the handler so
//!   the rejection uses the standard JSON error envelope.
//! - [`api_rate_limiter`]: token-bucket layer (governor) over every `/api`
//!   route (~100/min per IP).

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Header set by the edge proxy with the client address first.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Key used when the client address is unknown. All such clients share a
/// budget.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Number of tracked clients above which expired windows are pruned.
const PRUNE_THRESHOLD: usize = 1024;

// =============================================================================
// Client identification
// =============================================================================

/// Client key for the fixed-window limiter: the first `x-forwarded-for`
/// value, trimmed, or [`UNKNOWN_CLIENT`].
#[must_use]
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), str::to_string)
}

/// Key extractor for the governor layer.
///
/// Uses the first `x-forwarded-for` address, falling back to the socket peer
/// address when the server runs without a proxy in front.
#[derive(Clone, Copy)]
pub struct ForwardedIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ForwardedIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(ip) = req
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Fixed-window limiter
// =============================================================================

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client.
///
/// A window opens with a client's first request and lasts `window`; up to
/// `limit` requests are allowed inside it. The first request at or after the
/// window's end opens a new one.
///
/// State is process-local: running several instances multiplies the budget.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Newsletter sign-ups: 5 per 10 minutes.
    #[must_use]
    pub fn newsletter() -> Self {
        Self::new(5, Duration::from_secs(10 * 60))
    }

    /// Count a request from `key` now.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Count a request from `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(window) = windows.get_mut(key) {
            let resets_at = window.started + self.window;
            if now < resets_at {
                if window.count >= self.limit {
                    return RateDecision::Limited {
                        retry_after: resets_at - now,
                    };
                }
                window.count += 1;
                return RateDecision::Allowed {
                    remaining: self.limit - window.count,
                };
            }
        } else if windows.len() >= PRUNE_THRESHOLD {
            let length = self.window;
            windows.retain(|_, w| now < w.started + length);
        }

        windows.insert(
            key.to_string(),
            Window {
                started: now,
                count: 1,
            },
        );
        RateDecision::Allowed {
            remaining: self.limit.saturating_sub(1),
        }
    }

    /// Number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// =============================================================================
// Governor layer
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ForwardedIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for the API: ~100 requests per minute per IP.
///
/// Configuration: 1 request per second (replenish), burst of 50.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(1)` and `burst_size(50)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ForwardedIpKeyExtractor)
        .per_second(1) // Replenish quickly
        .burst_size(50) // Allow burst of 50 requests
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    const TEN_MINUTES: Duration = Duration::from_secs(600);

    #[test]
    fn test_sixth_request_in_window_is_rejected() {
        let limiter = FixedWindowLimiter::newsletter();
        let start = Instant::now();

        for i in 0..5u32 {
            assert_eq!(
                limiter.check_at("203.0.113.7", start + Duration::from_secs(u64::from(i) * 60)),
                RateDecision::Allowed { remaining: 4 - i }
            );
        }

        assert_eq!(
            limiter.check_at("203.0.113.7", start + Duration::from_secs(300)),
            RateDecision::Limited {
                retry_after: Duration::from_secs(300)
            }
        );
    }

    #[test]
    fn test_first_request_after_reset_is_accepted() {
        let limiter = FixedWindowLimiter::newsletter();
        let start = Instant::now();

        for _ in 0..6 {
            limiter.check_at("203.0.113.7", start);
        }
        assert!(matches!(
            limiter.check_at("203.0.113.7", start + TEN_MINUTES - Duration::from_millis(1)),
            RateDecision::Limited { .. }
        ));

        assert_eq!(
            limiter.check_at("203.0.113.7", start + TEN_MINUTES),
            RateDecision::Allowed { remaining: 4 }
        );
    }

    #[test]
    fn test_clients_are_counted_separately() {
        let limiter = FixedWindowLimiter::new(1, TEN_MINUTES);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), RateDecision::Limited { .. }));
        assert!(matches!(limiter.check_at("b", now), RateDecision::Allowed { .. }));
    }

    #[test]
    fn test_expired_windows_are_pruned() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();

        for i in 0..PRUNE_THRESHOLD {
            limiter.check_at(&format!("client-{i}"), start);
        }
        assert_eq!(limiter.tracked_clients(), PRUNE_THRESHOLD);

        limiter.check_at("latecomer", start + Duration::from_secs(2));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_client_key_uses_first_forwarded_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), UNKNOWN_CLIENT);

        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static(" 198.51.100.4 , 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "198.51.100.4");

        headers.insert(FORWARDED_FOR, HeaderValue::from_static(""));
        assert_eq!(client_key(&headers), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_governor_key_falls_back_to_peer_address() {
        let mut request = Request::builder().body(()).unwrap();
        assert!(ForwardedIpKeyExtractor.extract(&request).is_err());

        let peer: SocketAddr = "192.0.2.10:51000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(
            ForwardedIpKeyExtractor.extract(&request).unwrap(),
            peer.ip()
        );

        request
            .headers_mut()
            .insert(FORWARDED_FOR, HeaderValue::from_static("198.51.100.4"));
        assert_eq!(
            ForwardedIpKeyExtractor.extract(&request).unwrap().to_string(),
            "198.51.100.4"
        );
    }
}

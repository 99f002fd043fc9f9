//! Rate limiting using governor and `tower_governor`.
//!
//! Two mechanisms:
//! - [`api_rate_limiter`]: a per-IP layer over the whole `/api` tree, sized
//!   by [`ApiQuota`]
//! - [`AttemptLimiter`]: per-client budgets for login and registration,
//!   checked inside the handlers and keyed by [`ClientKey`]

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{Extensions, HeaderMap, Request, header, request::Parts};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::ApiQuota;

// =============================================================================
// Client identity
// =============================================================================

/// Proxy headers carrying the real client address, most trusted first.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Resolve the client IP from proxy headers, falling back to the peer
/// address of the connection.
///
/// For `X-Forwarded-For` only the first (client-most) entry is used.
#[must_use]
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

/// Key for per-client attempt budgets: client IP plus user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    #[must_use]
    pub fn from_parts(headers: &HeaderMap, extensions: &Extensions) -> Self {
        let ip = client_ip(headers, extensions)
            .map_or_else(|| "unknown".to_owned(), |ip| ip.to_string());
        let agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        Self(format!("{ip}|{agent}"))
    }
}

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(&parts.headers, &parts.extensions))
    }
}

// =============================================================================
// Attempt budgets
// =============================================================================

/// A per-key budget of attempts.
pub trait AttemptLimiter: Send + Sync {
    /// Spend one attempt for `key`. Returns `false` when the budget is used up.
    fn try_acquire(&self, key: &str) -> bool;
}

/// Keys tracked before stale entries are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// [`AttemptLimiter`] backed by a governor keyed rate limiter.
///
/// The budget refills continuously, reaching `per_minute` again one minute
/// after it was exhausted.
pub struct GovernorAttemptLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl GovernorAttemptLimiter {
    #[must_use]
    pub fn per_minute(attempts: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(attempts)),
        }
    }
}

impl AttemptLimiter for GovernorAttemptLimiter {
    fn try_acquire(&self, key: &str) -> bool {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&key.to_owned()).is_ok()
    }
}

// =============================================================================
// API layer
// =============================================================================

/// Key extractor for the API layer, using [`client_ip`].
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers(), req.extensions()).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for the API from `quota`.
///
/// Defaults to 1 request per second (replenish) with a burst of 50.
///
/// # Panics
///
/// This function will not panic. [`ApiQuota`] holds non-zero values and the
/// replenish interval is at least one millisecond, which
/// `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn api_rate_limiter(quota: ApiQuota) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_millisecond(quota.replenish_interval_ms())
        .burst_size(quota.burst.get())
        .finish()
        .expect("rate limiter config with non-zero interval and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn peer(addr: &str) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        ext
    }

    #[test]
    fn test_client_ip_prefers_cloudflare() {
        let h = headers(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(
            client_ip(&h, &Extensions::new()),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn test_client_ip_first_forwarded_entry() {
        let h = headers(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")]);
        assert_eq!(
            client_ip(&h, &Extensions::new()),
            Some("198.51.100.2".parse().unwrap())
        );
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let h = headers(&[("x-real-ip", "garbage")]);
        assert_eq!(
            client_ip(&h, &peer("192.0.2.9:51000")),
            Some("192.0.2.9".parse().unwrap())
        );
        assert_eq!(client_ip(&HeaderMap::new(), &Extensions::new()), None);
    }

    #[test]
    fn test_client_key_includes_user_agent() {
        let h = headers(&[("user-agent", "curl/8.0")]);
        let key = ClientKey::from_parts(&h, &peer("192.0.2.9:1"));
        assert_eq!(key.0, "192.0.2.9|curl/8.0");

        let anonymous = ClientKey::from_parts(&HeaderMap::new(), &Extensions::new());
        assert_eq!(anonymous.0, "unknown|unknown");
    }

    #[test]
    fn test_attempt_budget_per_key() {
        let limiter = GovernorAttemptLimiter::per_minute(NonZeroU32::new(3).unwrap());
        for _ in 0..3 {
            assert!(limiter.try_acquire("a"));
        }
        assert!(!limiter.try_acquire("a"));
        assert!(limiter.try_acquire("b"));
    }
}

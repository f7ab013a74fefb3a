//! Per-IP rate limiting for credential endpoints, using governor and
//! `tower_governor`.
//!
//! The client IP is the TCP peer address unless a trusted proxy header is
//! configured. Forwarding headers sent by clients are otherwise ignored.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::ConnectInfo,
    http::{HeaderName, Request},
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::RateLimitConfig;

/// Key extractor that uses the socket peer address, or the configured
/// proxy header when the server sits behind one.
#[derive(Debug, Clone, Default)]
pub struct ClientIpKeyExtractor {
    trusted_proxy_header: Option<HeaderName>,
}

impl ClientIpKeyExtractor {
    /// Key on the value of `header`, as set by a fronting proxy.
    #[must_use]
    pub const fn behind_proxy(header: HeaderName) -> Self {
        Self {
            trusted_proxy_header: Some(header),
        }
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        // The proxy appends the address it saw, so take the last entry
        if let Some(ip) = self
            .trusted_proxy_header
            .as_ref()
            .and_then(|name| req.headers().get(name))
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.rsplit(',').next())
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

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for signup, login, and refresh.
///
/// Defaults to 1 request every 6 seconds (replenish) with a burst of 5,
/// about 10 requests per minute per IP.
///
/// # Panics
///
/// This function will not panic. `RateLimitConfig` holds only non-zero
/// values, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(limits: &RateLimitConfig) -> RateLimiterLayer {
    let key_extractor = limits
        .trusted_proxy_header
        .clone()
        .map_or_else(ClientIpKeyExtractor::default, ClientIpKeyExtractor::behind_proxy);
    let config = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(limits.period_secs.get())
        .burst_size(limits.burst.get())
        .finish()
        .expect("rate limiter config with non-zero period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

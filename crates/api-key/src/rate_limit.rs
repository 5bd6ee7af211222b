//! Fixed-window rate limiting.
//!
//! Quotas reset at fixed wall-clock intervals rather than sliding
//! continuously. A caller can therefore burst up to the limit in the last
//! second of one window and again in the first second of the next, up to
//! twice the nominal rate across the boundary. That is a documented
//! characteristic of fixed-window counters, kept deliberately.
//!
//! State is plain in-process bookkeeping with no locking; it is safe only
//! under single-instance deployment. Swapping in an external atomic store
//! is an extension point, not part of this core.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::tier::RateLimitTier;

/// Window length for per-key limits.
const KEY_WINDOW_SECS: i64 = 3600;
/// Window length for per-IP limits.
const IP_WINDOW_SECS: i64 = 60;
/// Requests per window for unauthenticated traffic.
const IP_LIMIT: u32 = 30;

/// Counter state for one key within one window.
#[derive(Debug, Clone)]
pub struct RateLimitWindow {
    /// Requests seen in this window.
    pub count: u32,
    /// When the window expires. A window is live only while `now` is
    /// strictly before this instant.
    pub reset_at: DateTime<Utc>,
}

/// Quota snapshot returned with every decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// The window's request quota.
    pub limit: u32,
    /// Requests left in the window.
    pub remaining: u32,
    /// Window expiry in Unix seconds.
    pub reset: i64,
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed.
    Allowed(RateLimitInfo),
    /// Request is over quota.
    Limited(RateLimitInfo),
}

impl RateLimitDecision {
    /// Returns true if the request is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed(_))
    }

    /// The quota snapshot, whichever way the decision went.
    pub fn info(&self) -> &RateLimitInfo {
        match self {
            RateLimitDecision::Allowed(info) | RateLimitDecision::Limited(info) => info,
        }
    }
}

/// Maps a quota snapshot to the response headers.
pub fn rate_limit_headers(info: &RateLimitInfo) -> [(&'static str, String); 3] {
    [
        ("X-RateLimit-Limit", info.limit.to_string()),
        ("X-RateLimit-Remaining", info.remaining.to_string()),
        ("X-RateLimit-Reset", info.reset.to_string()),
    ]
}

/// Per-key fixed-window limiter (1-hour windows, quota from the tier).
#[derive(Debug, Default)]
pub struct ApiRateLimiter {
    windows: HashMap<String, RateLimitWindow>,
}

impl ApiRateLimiter {
    /// Creates an empty limiter.
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// Consumes one request slot for the key, or denies it.
    pub fn check(&mut self, key_id: &str, tier: RateLimitTier) -> RateLimitDecision {
        self.check_at(key_id, tier, Utc::now())
    }

    /// Reports the key's quota without consuming a request.
    pub fn status(&self, key_id: &str, tier: RateLimitTier) -> RateLimitInfo {
        self.status_at(key_id, tier, Utc::now())
    }

    /// Deletes every expired window. Explicit maintenance; nothing calls
    /// this automatically.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(Utc::now())
    }

    fn check_at(&mut self, key_id: &str, tier: RateLimitTier, now: DateTime<Utc>) -> RateLimitDecision {
        let limit = tier.requests_per_hour();

        match self.windows.get_mut(key_id) {
            Some(window) if now < window.reset_at => {
                if window.count >= limit {
                    RateLimitDecision::Limited(RateLimitInfo {
                        limit,
                        remaining: 0,
                        reset: window.reset_at.timestamp(),
                    })
                } else {
                    window.count += 1;
                    RateLimitDecision::Allowed(RateLimitInfo {
                        limit,
                        remaining: limit - window.count,
                        reset: window.reset_at.timestamp(),
                    })
                }
            }
            // Absent or expired: start a fresh window with this request.
            _ => {
                let reset_at = now + Duration::seconds(KEY_WINDOW_SECS);
                self.windows
                    .insert(key_id.to_string(), RateLimitWindow { count: 1, reset_at });

                RateLimitDecision::Allowed(RateLimitInfo {
                    limit,
                    remaining: limit - 1,
                    reset: reset_at.timestamp(),
                })
            }
        }
    }

    fn status_at(&self, key_id: &str, tier: RateLimitTier, now: DateTime<Utc>) -> RateLimitInfo {
        let limit = tier.requests_per_hour();

        match self.windows.get(key_id) {
            Some(window) if now < window.reset_at => RateLimitInfo {
                limit,
                remaining: limit.saturating_sub(window.count),
                reset: window.reset_at.timestamp(),
            },
            _ => RateLimitInfo {
                limit,
                remaining: limit,
                reset: (now + Duration::seconds(KEY_WINDOW_SECS)).timestamp(),
            },
        }
    }

    fn cleanup_at(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.reset_at);
        before - self.windows.len()
    }
}

/// Result of an IP rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Seconds until the window resets, set when denied.
    pub retry_after: Option<u64>,
}

/// Per-IP fixed-window limiter for unauthenticated traffic
/// (1-minute windows, 30 requests each).
#[derive(Debug, Default)]
pub struct IpRateLimiter {
    windows: HashMap<String, RateLimitWindow>,
}

impl IpRateLimiter {
    /// Creates an empty limiter.
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// Consumes one request slot for the address, or denies it.
    pub fn check(&mut self, ip: &str) -> IpRateLimitDecision {
        self.check_at(ip, Utc::now())
    }

    /// Deletes every expired window.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(Utc::now())
    }

    fn check_at(&mut self, ip: &str, now: DateTime<Utc>) -> IpRateLimitDecision {
        match self.windows.get_mut(ip) {
            Some(window) if now < window.reset_at => {
                if window.count >= IP_LIMIT {
                    let retry_after = (window.reset_at - now).num_seconds().max(0) as u64;
                    IpRateLimitDecision {
                        allowed: false,
                        retry_after: Some(retry_after),
                    }
                } else {
                    window.count += 1;
                    IpRateLimitDecision {
                        allowed: true,
                        retry_after: None,
                    }
                }
            }
            _ => {
                let reset_at = now + Duration::seconds(IP_WINDOW_SECS);
                self.windows
                    .insert(ip.to_string(), RateLimitWindow { count: 1, reset_at });

                IpRateLimitDecision {
                    allowed: true,
                    retry_after: None,
                }
            }
        }
    }

    fn cleanup_at(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.reset_at);
        before - self.windows.len()
    }
}

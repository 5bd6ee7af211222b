//! Rate limit tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiKeyError;

/// Subscription tier controlling a key's request quotas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitTier {
    /// 100 requests/hour, 1,000/day.
    #[default]
    Free,
    /// 10,000 requests/hour, 100,000/day.
    Pro,
    /// 100,000 requests/hour, 1,000,000/day.
    Enterprise,
}

impl RateLimitTier {
    /// Hourly request quota.
    pub fn requests_per_hour(&self) -> u32 {
        match self {
            RateLimitTier::Free => 100,
            RateLimitTier::Pro => 10_000,
            RateLimitTier::Enterprise => 100_000,
        }
    }

    /// Daily request quota.
    pub fn requests_per_day(&self) -> u32 {
        match self {
            RateLimitTier::Free => 1_000,
            RateLimitTier::Pro => 100_000,
            RateLimitTier::Enterprise => 1_000_000,
        }
    }

    /// The tier name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitTier::Free => "free",
            RateLimitTier::Pro => "pro",
            RateLimitTier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for RateLimitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateLimitTier {
    type Err = ApiKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(RateLimitTier::Free),
            "pro" => Ok(RateLimitTier::Pro),
            "enterprise" => Ok(RateLimitTier::Enterprise),
            other => Err(ApiKeyError::UnknownTier(other.to_string())),
        }
    }
}

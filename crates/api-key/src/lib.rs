//! # TrackVerse API Keys
//!
//! Credential core for the TrackVerse API:
//! - Key generation with hash-only storage
//! - Permission scope checks
//! - Rate limit tiers and fixed-window enforcement
//!
//! ## Example
//!
//! ```rust,ignore
//! use trackverse_api_key::{ApiKey, ApiRateLimiter, CreateApiKeyOptions, Permission, RateLimitTier};
//!
//! let (plaintext, key) = ApiKey::create(
//!     "user-1",
//!     "CI key",
//!     vec![Permission::ReadPrs, Permission::WriteResults],
//!     CreateApiKeyOptions::new(),
//! );
//! // `plaintext` is shown to the caller once; only `key.key_hash` is stored.
//!
//! let mut limiter = ApiRateLimiter::new();
//! let decision = limiter.check(&key.id, RateLimitTier::Free);
//! assert!(decision.is_allowed());
//! ```

mod error;
mod generator;
mod key;
mod permission;
mod rate_limit;
mod tier;

pub use error::{ApiKeyError, ApiKeyResult};
pub use generator::{
    generate_api_key, generate_test_api_key, hash_key, is_valid_key_format, verify_key,
    GeneratedKey,
};
pub use key::{ApiKey, CreateApiKeyOptions, DEFAULT_RATE_LIMIT};
pub use permission::{validate_permissions, Permission, PermissionValidation};
pub use rate_limit::{
    rate_limit_headers, ApiRateLimiter, IpRateLimitDecision, IpRateLimiter, RateLimitDecision,
    RateLimitInfo, RateLimitWindow,
};
pub use tier::RateLimitTier;

//! API key error types.

use thiserror::Error;

/// Result type for API key operations.
pub type ApiKeyResult<T> = Result<T, ApiKeyError>;

/// Error type for API key operations.
///
/// Most of this crate is total: bad input (unknown scopes, malformed keys,
/// exhausted quotas) is reported through return values. The variants here
/// cover the string-parsing seams only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiKeyError {
    /// Unknown permission scope.
    #[error("unknown permission scope: {0}")]
    UnknownPermission(String),

    /// Unknown rate limit tier.
    #[error("unknown rate limit tier: {0}")]
    UnknownTier(String),
}

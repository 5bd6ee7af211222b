//! API key records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::generator::{generate_api_key, generate_test_api_key};
use crate::permission::Permission;

/// Default quota for keys created without an explicit rate limit, in
/// requests per hour.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// A caller's API credential.
///
/// Only the SHA-256 hash and a short display prefix of the secret are kept;
/// the plaintext exists solely in the return value of [`ApiKey::create`].
/// Keys are never hard-deleted: `revoked_at` marks them dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Unique identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Human-readable name.
    pub name: String,
    /// SHA-256 hex digest of the secret. Never serialized outward.
    #[serde(skip_serializing, default)]
    pub key_hash: String,
    /// Display-safe identifier (first characters of the random portion).
    pub key_prefix: String,
    /// Granted permission scopes.
    pub permissions: Vec<Permission>,
    /// Quota in requests per hour.
    pub rate_limit: u32,
    /// Total requests made with this key.
    pub usage_count: u64,
    /// Last time the key was used.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Revocation timestamp, if revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Options for [`ApiKey::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateApiKeyOptions {
    rate_limit: Option<u32>,
    expires_in_days: Option<i64>,
    test: bool,
}

impl CreateApiKeyOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quota in requests per hour.
    pub fn rate_limit(mut self, requests_per_hour: u32) -> Self {
        self.rate_limit = Some(requests_per_hour);
        self
    }

    /// Makes the key expire the given number of days from creation.
    pub fn expires_in_days(mut self, days: i64) -> Self {
        self.expires_in_days = Some(days);
        self
    }

    /// Generates a `tv_test_` key instead of a live one.
    pub fn test_key(mut self) -> Self {
        self.test = true;
        self
    }
}

impl ApiKey {
    /// Creates a new key, returning the one-time plaintext secret and the
    /// persistable record.
    pub fn create(
        user_id: impl Into<String>,
        name: impl Into<String>,
        permissions: Vec<Permission>,
        options: CreateApiKeyOptions,
    ) -> (String, Self) {
        let generated = if options.test {
            generate_test_api_key()
        } else {
            generate_api_key()
        };
        let now = Utc::now();

        let key = Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            key_hash: generated.key_hash,
            key_prefix: generated.key_prefix,
            permissions,
            rate_limit: options.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT),
            usage_count: 0,
            last_used_at: None,
            expires_at: options.expires_in_days.map(|days| now + Duration::days(days)),
            created_at: now,
            revoked_at: None,
        };

        (generated.key, key)
    }

    /// Checks if the key has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|e| Utc::now() > e).unwrap_or(false)
    }

    /// Checks if the key has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Checks if the key is usable (neither expired nor revoked).
    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_revoked()
    }

    /// Checks membership of a single scope.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Checks that at least one of the scopes is granted.
    pub fn has_any_permission(&self, required: &[Permission]) -> bool {
        required.iter().any(|p| self.has_permission(*p))
    }

    /// Checks that every scope is granted.
    pub fn has_all_permissions(&self, required: &[Permission]) -> bool {
        required.iter().all(|p| self.has_permission(*p))
    }

    /// Records one use of the key.
    pub fn record_usage(&mut self) {
        self.usage_count += 1;
        self.last_used_at = Some(Utc::now());
    }

    /// Marks the key revoked. Idempotent; the first revocation time wins.
    pub fn revoke(&mut self) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{is_valid_key_format, verify_key};

    #[test]
    fn test_create_returns_plaintext_once() {
        let (plaintext, key) = ApiKey::create(
            "user-1",
            "CI key",
            vec![Permission::ReadPrs],
            CreateApiKeyOptions::new(),
        );

        assert!(is_valid_key_format(&plaintext));
        assert_ne!(plaintext, key.key_hash);
        assert!(verify_key(&plaintext, &key.key_hash));
        assert_eq!(key.rate_limit, DEFAULT_RATE_LIMIT);
        assert!(key.is_valid());
    }

    #[test]
    fn test_hash_not_serialized() {
        let (_, key) = ApiKey::create(
            "user-1",
            "CI key",
            vec![Permission::ReadPrs],
            CreateApiKeyOptions::new(),
        );

        let json = serde_json::to_value(&key).unwrap();
        assert!(json.get("key_hash").is_none());
        assert!(json.get("key_prefix").is_some());
    }

    #[test]
    fn test_test_key_prefix() {
        let (plaintext, _) = ApiKey::create(
            "user-1",
            "sandbox",
            vec![],
            CreateApiKeyOptions::new().test_key(),
        );
        assert!(plaintext.starts_with("tv_test_"));
    }

    #[test]
    fn test_expiry() {
        let (_, key) = ApiKey::create(
            "user-1",
            "short-lived",
            vec![],
            CreateApiKeyOptions::new().expires_in_days(30),
        );
        assert!(key.expires_at.is_some());
        assert!(!key.is_expired());

        let (_, mut expired) = ApiKey::create("user-1", "stale", vec![], CreateApiKeyOptions::new());
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(expired.is_expired());
        assert!(!expired.is_valid());
    }

    #[test]
    fn test_revocation_is_sticky() {
        let (_, mut key) = ApiKey::create("user-1", "temp", vec![], CreateApiKeyOptions::new());
        assert!(!key.is_revoked());

        key.revoke();
        let first = key.revoked_at;
        assert!(key.is_revoked());
        assert!(!key.is_valid());

        key.revoke();
        assert_eq!(key.revoked_at, first);
    }

    #[test]
    fn test_permission_checks() {
        let (_, key) = ApiKey::create(
            "user-1",
            "reader",
            vec![Permission::ReadPrs, Permission::ReadWorkouts],
            CreateApiKeyOptions::new(),
        );

        assert!(key.has_permission(Permission::ReadPrs));
        assert!(!key.has_permission(Permission::WriteResults));
        assert!(key.has_any_permission(&[Permission::WriteResults, Permission::ReadPrs]));
        assert!(!key.has_any_permission(&[Permission::WriteResults, Permission::WriteWorkouts]));
        assert!(key.has_all_permissions(&[Permission::ReadPrs, Permission::ReadWorkouts]));
        assert!(!key.has_all_permissions(&[Permission::ReadPrs, Permission::ReadMeets]));
    }

    #[test]
    fn test_usage_tracking() {
        let (_, mut key) = ApiKey::create("user-1", "busy", vec![], CreateApiKeyOptions::new());
        assert_eq!(key.usage_count, 0);
        assert!(key.last_used_at.is_none());

        key.record_usage();
        key.record_usage();
        assert_eq!(key.usage_count, 2);
        assert!(key.last_used_at.is_some());
    }
}

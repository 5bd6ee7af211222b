//! Permission scopes for API keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiKeyError;

/// A permission scope an API key can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Read athlete profiles.
    #[serde(rename = "read:profile")]
    ReadProfile,
    /// Read personal records.
    #[serde(rename = "read:prs")]
    ReadPrs,
    /// Read workout logs.
    #[serde(rename = "read:workouts")]
    ReadWorkouts,
    /// Read rankings.
    #[serde(rename = "read:rankings")]
    ReadRankings,
    /// Read meet schedules and entries.
    #[serde(rename = "read:meets")]
    ReadMeets,
    /// Create and update workouts.
    #[serde(rename = "write:workouts")]
    WriteWorkouts,
    /// Submit meet results.
    #[serde(rename = "write:results")]
    WriteResults,
}

impl Permission {
    /// Every valid scope, in display order.
    pub const ALL: [Permission; 7] = [
        Permission::ReadProfile,
        Permission::ReadPrs,
        Permission::ReadWorkouts,
        Permission::ReadRankings,
        Permission::ReadMeets,
        Permission::WriteWorkouts,
        Permission::WriteResults,
    ];

    /// The scope string used on the wire and in stored keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadProfile => "read:profile",
            Permission::ReadPrs => "read:prs",
            Permission::ReadWorkouts => "read:workouts",
            Permission::ReadRankings => "read:rankings",
            Permission::ReadMeets => "read:meets",
            Permission::WriteWorkouts => "write:workouts",
            Permission::WriteResults => "write:results",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ApiKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ApiKeyError::UnknownPermission(s.to_string()))
    }
}

/// Outcome of validating a requested permission list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionValidation {
    /// True when every requested scope is known.
    pub valid: bool,
    /// The scopes that did not parse, verbatim.
    pub invalid: Vec<String>,
}

/// Checks a requested permission list against the known scopes.
///
/// Unknown scopes are reported by value; this never fails.
pub fn validate_permissions<S: AsRef<str>>(requested: &[S]) -> PermissionValidation {
    let invalid: Vec<String> = requested
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| Permission::from_str(s).is_err())
        .map(String::from)
        .collect();

    PermissionValidation {
        valid: invalid.is_empty(),
        invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>(), Ok(permission));
        }
    }

    #[test]
    fn test_unknown_scope() {
        let err = "admin:everything".parse::<Permission>().unwrap_err();
        assert_eq!(
            err,
            ApiKeyError::UnknownPermission("admin:everything".to_string())
        );
    }

    #[test]
    fn test_validate_permissions() {
        let result = validate_permissions(&["read:prs", "write:results"]);
        assert!(result.valid);
        assert!(result.invalid.is_empty());

        let result = validate_permissions(&["read:prs", "read:secrets", "delete:all"]);
        assert!(!result.valid);
        assert_eq!(result.invalid, vec!["read:secrets", "delete:all"]);
    }

    #[test]
    fn test_serde_uses_scope_strings() {
        let json = serde_json::to_string(&Permission::WriteWorkouts).unwrap();
        assert_eq!(json, "\"write:workouts\"");

        let parsed: Permission = serde_json::from_str("\"read:meets\"").unwrap();
        assert_eq!(parsed, Permission::ReadMeets);
    }
}

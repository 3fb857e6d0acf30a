//! Token types for bearer authentication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair issued by the Campfire API
///
/// The pair only ever changes as a unit: login and a successful refresh
/// install both tokens, logout clears both. Readers never observe an
/// access token paired with a stale refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Bearer token attached to authenticated requests
    pub access: String,

    /// Token exchanged for a new pair when the access token expires
    pub refresh: String,

    /// Absolute access-token expiry, when the server reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    /// Create a pair without expiry metadata
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self { access: access.into(), refresh: refresh.into(), expires_at: None }
    }

    /// Create a pair expiring `expires_in` seconds from now
    #[must_use]
    pub fn with_expiry(
        access: impl Into<String>,
        refresh: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        let expires_at = if expires_in > 0 {
            Some(Utc::now() + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self { access: access.into(), refresh: refresh.into(), expires_at }
    }

    /// Check whether the access token is expired or will expire within the
    /// given threshold
    ///
    /// Returns `false` when no expiry is known; expiry detection then falls
    /// back to the server answering 401.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_without_expiry_is_never_considered_expired() {
        let pair = TokenPair::new("access", "refresh");
        assert!(pair.expires_at.is_none());
        assert!(!pair.is_expired(3600));
    }

    #[test]
    fn expiry_check_honors_threshold() {
        let pair = TokenPair::with_expiry("access", "refresh", 3600);
        assert!(!pair.is_expired(300));
        assert!(pair.is_expired(7200));
    }

    #[test]
    fn non_positive_expiry_is_treated_as_unknown() {
        let pair = TokenPair::with_expiry("access", "refresh", 0);
        assert!(pair.expires_at.is_none());
    }

    #[test]
    fn serialization_omits_missing_expiry() {
        let pair = TokenPair::new("a", "r");
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json, serde_json::json!({"access": "a", "refresh": "r"}));
    }
}

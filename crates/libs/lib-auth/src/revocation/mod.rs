//! # Token Revocation
//!
//! In-process blacklist of logged-out tokens. Entries carry the token's own
//! expiration timestamp so the sweep can drop them once the token would be
//! refused by validation anyway.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lib_utils::time::now_utc;

/// Revoked credentials, keyed by the raw token string.
#[derive(Debug, Default)]
pub struct RevokedTokens {
    entries: RwLock<HashMap<String, i64>>,
}

impl RevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a token as revoked until `expires_at` (Unix timestamp).
    pub fn revoke(&self, token: &str, expires_at: i64) {
        self.write_entries().insert(token.to_string(), expires_at);
    }

    /// Whether a token has been revoked.
    pub fn is_revoked(&self, token: &str) -> bool {
        self.read_entries().contains_key(token)
    }

    /// Drop entries whose tokens have expired. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = now_utc().timestamp();
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, i64>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, i64>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_and_check() {
        let revoked = RevokedTokens::new();
        let exp = now_utc().timestamp() + 3600;

        assert!(!revoked.is_revoked("some-token"));

        revoked.revoke("some-token", exp);

        assert!(revoked.is_revoked("some-token"));
        assert!(!revoked.is_revoked("other-token"));
    }

    #[test]
    fn test_prune_drops_only_expired_entries() {
        let revoked = RevokedTokens::new();
        let now = now_utc().timestamp();

        revoked.revoke("expired-token", now - 10);
        revoked.revoke("live-token", now + 3600);
        assert_eq!(revoked.len(), 2);

        let removed = revoked.prune_expired();

        assert_eq!(removed, 1);
        assert!(!revoked.is_revoked("expired-token"));
        assert!(revoked.is_revoked("live-token"));
    }

    #[test]
    fn test_prune_on_empty_list() {
        let revoked = RevokedTokens::new();
        assert_eq!(revoked.prune_expired(), 0);
        assert!(revoked.is_empty());
    }
}

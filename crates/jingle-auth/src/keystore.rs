//! In-memory auth key store
//!
//! Maps each issued auth key to the user it was issued for and the instant
//! it stops being valid. Expiry is checked lazily on validation; expired
//! records stay in the map until [`AuthKeyStore::evict_expired`] is called.
//!
//! The store lives in process memory only. Restarting the process drops
//! every issued key and all users must log in again.
//!
//! # Thread Safety
//!
//! Backed by a sharded `DashMap`; issuance and validation lock a single
//! shard for the duration of one map operation.

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jingle_core::UserId;
use rand::{rngs::OsRng, Rng};
use std::borrow::Borrow;
use std::sync::Arc;
use std::time::Duration;

/// Number of symbols in an auth key
pub const TOKEN_LENGTH: usize = 30;

/// Symbols an auth key is drawn from
pub const TOKEN_ALPHABET: &[u8; 37] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

/// Lifetime of an auth key when the caller does not pick one (20 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_millis(1_200_000);

/// An opaque bearer key handed out after a successful login
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AuthToken(String);

impl AuthToken {
    /// Draw a fresh key from the operating system RNG
    fn generate() -> Self {
        let mut rng = OsRng;
        let token = (0..TOKEN_LENGTH)
            .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters only, for log lines
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}***")
    }
}

impl std::fmt::Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken({})", self.redacted())
    }
}

impl Borrow<str> for AuthToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// What an auth key was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyGrant {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Concurrent store of issued auth keys
pub struct AuthKeyStore {
    keys: DashMap<AuthToken, KeyGrant>,
    clock: Arc<dyn Clock>,
}

impl AuthKeyStore {
    /// Create an empty store that reads the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store that reads `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            keys: DashMap::new(),
            clock,
        }
    }

    /// Issue a key for `user_id` with the default 20 minute lifetime
    pub fn issue(&self, user_id: UserId) -> AuthToken {
        self.issue_with_ttl(user_id, DEFAULT_TTL)
    }

    /// Issue a key for `user_id` that expires `ttl` from now
    pub fn issue_with_ttl(&self, user_id: UserId, ttl: Duration) -> AuthToken {
        self.issue_grant(user_id, ttl).0
    }

    /// Issue a key like [`AuthKeyStore::issue_with_ttl`], also returning what it was bound to
    pub fn issue_grant(&self, user_id: UserId, ttl: Duration) -> (AuthToken, KeyGrant) {
        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let grant = KeyGrant {
            user_id,
            expires_at,
        };

        // never rebind an issued key
        loop {
            let token = AuthToken::generate();
            if let Entry::Vacant(slot) = self.keys.entry(token.clone()) {
                slot.insert(grant);
                return (token, grant);
            }
        }
    }

    /// Check that `token` was issued to `user_id` and is still live
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Key is valid for this user
    /// * `Err(AuthError::InvalidAuthKey)` - Unknown key, or issued to another user
    /// * `Err(AuthError::ExpiredAuthKey)` - Right user, but the expiry instant has been reached
    pub fn validate(&self, token: &str, user_id: UserId) -> Result<(), AuthError> {
        let grant = self
            .keys
            .get(token)
            .map(|entry| *entry.value())
            .ok_or(AuthError::InvalidAuthKey)?;

        if grant.user_id != user_id {
            return Err(AuthError::InvalidAuthKey);
        }

        if self.clock.now() >= grant.expires_at {
            return Err(AuthError::ExpiredAuthKey);
        }

        Ok(())
    }

    /// Look up what a key was issued for, expired or not
    pub fn grant(&self, token: &str) -> Option<KeyGrant> {
        self.keys.get(token).map(|entry| *entry.value())
    }

    /// Remove one key; returns whether it existed
    pub fn revoke(&self, token: &str) -> bool {
        self.keys.remove(token).is_some()
    }

    /// Remove every key issued to `user_id`; returns how many were removed
    pub fn revoke_user(&self, user_id: UserId) -> usize {
        let mut removed = 0;
        self.keys.retain(|_, grant| {
            let keep = grant.user_id != user_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Drop every key whose expiry instant has been reached
    ///
    /// Nothing calls this automatically; the owner decides how often to sweep.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.keys.retain(|_, grant| {
            let keep = now < grant.expires_at;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of records held, expired ones included
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for AuthKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuthKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeyStore")
            .field("keys", &self.keys.len())
            .finish()
    }
}

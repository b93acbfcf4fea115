//! Authentication service layer
//!
//! Composes the password hasher and the auth key store into the login and
//! authorize flows. The service never touches persistence itself: login is
//! handed a [`UserLookup`], authorize is handed an already loaded [`User`].

use crate::audit::{audit_log, AuditEvent};
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::keystore::{AuthKeyStore, AuthToken};
use crate::password::{validate_password_length, PasswordHasher};
use crate::pool::HashingPool;
use jingle_core::{AuthConfig, User, UserId, UserLookup};
use std::sync::Arc;
use std::time::Duration;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user_id: UserId,
    pub token: AuthToken,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    hasher: PasswordHasher,
    keys: Arc<AuthKeyStore>,
    pool: HashingPool,
    token_ttl: Duration,
}

impl AuthService {
    /// Create a new authentication service reading the system clock
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new authentication service whose keys expire against `clock`
    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            hasher: PasswordHasher::new(config.salt_scheme),
            keys: Arc::new(AuthKeyStore::with_clock(clock)),
            pool: HashingPool::new(config.hash_workers, config.hash_queue_depth),
            token_ttl: config.token_ttl(),
        }
    }

    /// Hash a password for storage (signup, password change)
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - Credential bytes to persist
    /// * `Err(AuthError::InvalidPassword)` - Password shorter than 8 characters
    /// * `Err(AuthError::Overloaded)` - Hashing pool is full
    pub async fn hash(&self, password: &str) -> Result<Vec<u8>, AuthError> {
        validate_password_length(password)?;

        let hasher = self.hasher;
        let password = password.to_owned();
        self.pool
            .run(move || hasher.hash_for_storage(&password))
            .await?
    }

    /// Login with username and password
    ///
    /// Unknown username, wrong password and a password too short to ever
    /// match all fail with the same [`AuthError::InvalidCredentials`].
    ///
    /// # Returns
    ///
    /// * `Ok(LoginOutcome)` - The user's id and a fresh auth key
    /// * `Err(AuthError::InvalidCredentials)` - Login rejected
    /// * `Err(AuthError::Overloaded)` - Hashing pool is full
    pub async fn login<L>(
        &self,
        username: &str,
        password: &str,
        users: &L,
    ) -> Result<LoginOutcome, AuthError>
    where
        L: UserLookup + ?Sized,
    {
        let user = users
            .by_username(username)
            .await
            .map_err(|e| AuthError::Internal(format!("Failed to fetch user: {e}")))?;

        let hasher = self.hasher;
        let attempt = password.to_owned();

        let Some(user) = user else {
            // Spend the same work as a real check so timing does not reveal unknown usernames.
            let _ = self
                .pool
                .run(move || PasswordHasher::derive(&attempt))
                .await?;
            return Err(login_failure(username, "unknown username"));
        };

        let stored = user.password_hash.clone();
        let verified = self
            .pool
            .run(move || hasher.verify(&attempt, &stored))
            .await?;

        match verified {
            Ok(true) => {}
            Ok(false) => return Err(login_failure(username, "password mismatch")),
            Err(AuthError::InvalidPassword) => {
                return Err(login_failure(username, "password below minimum length"))
            }
            Err(e) => return Err(e),
        }

        let user_id = user
            .id
            .ok_or_else(|| AuthError::Internal("stored user has no id".to_string()))?;
        let token = self.issue_key(user_id, None);

        audit_log(&AuditEvent::LoginSuccess {
            user_id,
            username: username.to_string(),
        });

        Ok(LoginOutcome { user_id, token })
    }

    /// Issue an auth key for `user_id`, using the configured lifetime unless `ttl` is given
    pub fn issue_key(&self, user_id: UserId, ttl: Option<Duration>) -> AuthToken {
        let (token, grant) = self
            .keys
            .issue_grant(user_id, ttl.unwrap_or(self.token_ttl));

        audit_log(&AuditEvent::KeyIssued {
            user_id,
            key_prefix: token.redacted(),
            expires_at: grant.expires_at,
        });

        token
    }

    /// Check that `token` is a live auth key for `user`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Authorized
    /// * `Err(AuthError::InvalidArgument)` - `user` has not been assigned an id
    /// * `Err(AuthError::InvalidAuthKey)` - Unknown key or another user's key
    /// * `Err(AuthError::ExpiredAuthKey)` - Key has expired
    pub fn authorize(&self, token: &str, user: &User) -> Result<(), AuthError> {
        let user_id = user
            .id
            .ok_or_else(|| AuthError::InvalidArgument("User id cannot be null".to_string()))?;

        self.keys.validate(token, user_id).map_err(|e| {
            audit_log(&AuditEvent::AuthorizationFailure {
                user_id,
                key_prefix: AuthToken::from(token).redacted(),
                reason: e.to_string(),
            });
            e
        })
    }

    /// Remove every auth key held by `user_id`
    pub fn revoke_user(&self, user_id: UserId) -> usize {
        let count = self.keys.revoke_user(user_id);
        if count > 0 {
            audit_log(&AuditEvent::KeysRevoked { user_id, count });
        }
        count
    }

    /// Sweep expired auth keys out of the store
    pub fn evict_expired(&self) -> usize {
        let count = self.keys.evict_expired();
        if count > 0 {
            audit_log(&AuditEvent::KeysEvicted {
                count,
                remaining: self.keys.len(),
            });
        }
        count
    }

    /// The underlying key store
    pub fn keys(&self) -> &AuthKeyStore {
        &self.keys
    }

    pub fn pool(&self) -> &HashingPool {
        &self.pool
    }
}

fn login_failure(username: &str, reason: &str) -> AuthError {
    audit_log(&AuditEvent::LoginFailure {
        username: username.to_string(),
        reason: reason.to_string(),
    });
    AuthError::InvalidCredentials
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::password::hash_password;
    use jingle_core::{SaltScheme, StoreError};
    use std::collections::HashMap;

    struct Users {
        by_name: HashMap<String, User>,
    }

    impl Users {
        fn with(users: Vec<User>) -> Self {
            Self {
                by_name: users
                    .into_iter()
                    .map(|u| (u.username().to_string(), u))
                    .collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl UserLookup for Users {
        async fn by_id(&self, id: UserId) -> jingle_core::Result<Option<User>> {
            Ok(self.by_name.values().find(|u| u.id == Some(id)).cloned())
        }

        async fn by_username(&self, username: &str) -> jingle_core::Result<Option<User>> {
            Ok(self.by_name.get(username).cloned())
        }
    }

    struct BrokenLookup;

    #[async_trait::async_trait]
    impl UserLookup for BrokenLookup {
        async fn by_id(&self, _id: UserId) -> jingle_core::Result<Option<User>> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn by_username(&self, _username: &str) -> jingle_core::Result<Option<User>> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    fn test_config() -> AuthConfig {
        AuthConfig {
            hash_workers: 2,
            hash_queue_depth: 8,
            ..AuthConfig::default()
        }
    }

    fn user(id: i64, username: &str, password: &str) -> User {
        User::new(
            username,
            None,
            None,
            format!("{username}@example.com"),
            hash_password(password).unwrap().to_vec(),
        )
        .unwrap()
        .with_id(UserId(id))
    }

    fn alice_directory() -> Users {
        Users::with(vec![user(1, "alice", "longenoughpw")])
    }

    #[tokio::test]
    async fn test_login_success() {
        let service = AuthService::new(&test_config());
        let users = alice_directory();

        let outcome = service
            .login("alice", "longenoughpw", &users)
            .await
            .unwrap();

        assert_eq!(outcome.user_id, UserId(1));
        assert_eq!(
            service.authorize(outcome.token.as_str(), &users.by_name["alice"]),
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = AuthService::new(&test_config());
        let result = service
            .login("alice", "wrongpassword", &alice_directory())
            .await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
        assert!(service.keys().is_empty());
    }

    #[tokio::test]
    async fn test_login_unknown_user_same_error() {
        let service = AuthService::new(&test_config());
        let result = service
            .login("nosuchuser", "whatever12", &alice_directory())
            .await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_short_password_is_not_a_validation_error() {
        let service = AuthService::new(&test_config());
        let result = service.login("alice", "short", &alice_directory()).await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_lookup_failure_is_internal() {
        let service = AuthService::new(&test_config());
        let result = service.login("alice", "longenoughpw", &BrokenLookup).await;

        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[tokio::test]
    async fn test_login_accepts_random_salt_credentials() {
        let config = AuthConfig {
            salt_scheme: SaltScheme::Random,
            ..test_config()
        };
        let service = AuthService::new(&config);
        let stored = service.hash("longenoughpw").await.unwrap();

        let mut alice = user(1, "alice", "longenoughpw");
        alice.password_hash = stored;
        let users = Users::with(vec![alice]);

        assert!(service.login("alice", "longenoughpw", &users).await.is_ok());
        assert_eq!(
            service.login("alice", "wrongpassword", &users).await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_hash_keeps_distinct_validation_error() {
        let service = AuthService::new(&test_config());

        assert_eq!(service.hash("short").await, Err(AuthError::InvalidPassword));
        assert_eq!(
            service.hash("longenoughpw").await.unwrap(),
            hash_password("longenoughpw").unwrap().to_vec()
        );
    }

    #[test]
    fn test_authorize_expiry_and_ownership() {
        let clock = Arc::new(ManualClock::default());
        let service = AuthService::with_clock(&test_config(), clock.clone());
        let owner = user(42, "owner", "longenoughpw");
        let other = user(7, "other", "longenoughpw");

        let token = service.issue_key(UserId(42), Some(Duration::from_millis(1000)));

        assert_eq!(service.authorize(token.as_str(), &owner), Ok(()));
        assert_eq!(
            service.authorize(token.as_str(), &other),
            Err(AuthError::InvalidAuthKey)
        );

        clock.advance(Duration::from_millis(1001));
        assert_eq!(
            service.authorize(token.as_str(), &owner),
            Err(AuthError::ExpiredAuthKey)
        );
    }

    #[test]
    fn test_authorize_requires_user_id() {
        let service = AuthService::new(&test_config());
        let token = service.issue_key(UserId(1), None);
        let unsaved = User::new("new", None, None, "new@example.com", vec![]).unwrap();

        assert!(matches!(
            service.authorize(token.as_str(), &unsaved),
            Err(AuthError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_issue_key_uses_configured_ttl() {
        let clock = Arc::new(ManualClock::default());
        let config = AuthConfig {
            token_ttl_ms: 5_000,
            ..test_config()
        };
        let service = AuthService::with_clock(&config, clock.clone());
        let token = service.issue_key(UserId(1), None);
        let owner = user(1, "owner", "longenoughpw");

        clock.advance(Duration::from_millis(4_999));
        assert_eq!(service.authorize(token.as_str(), &owner), Ok(()));
        clock.advance(Duration::from_millis(1));
        assert_eq!(
            service.authorize(token.as_str(), &owner),
            Err(AuthError::ExpiredAuthKey)
        );
    }

    #[test]
    fn test_revoke_and_evict() {
        let clock = Arc::new(ManualClock::default());
        let service = AuthService::with_clock(&test_config(), clock.clone());

        let revoked = service.issue_key(UserId(1), None);
        service.issue_key(UserId(2), Some(Duration::from_millis(10)));
        service.issue_key(UserId(3), None);

        assert_eq!(service.revoke_user(UserId(1)), 1);
        assert_eq!(
            service.authorize(revoked.as_str(), &user(1, "a", "longenoughpw")),
            Err(AuthError::InvalidAuthKey)
        );

        clock.advance(Duration::from_secs(1));
        assert_eq!(service.evict_expired(), 1);
        assert_eq!(service.keys().len(), 1);
    }

    #[test]
    fn test_distinct_tokens_for_distinct_users() {
        let service = AuthService::new(&test_config());
        let a = service.issue_key(UserId(1), None);
        let b = service.issue_key(UserId(2), None);
        assert_ne!(a, b);
    }
}

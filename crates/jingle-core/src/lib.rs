//! Jingle Core - User models, collaborator traits, and shared types
//!
//! This crate defines the abstractions shared by the authentication core and
//! the HTTP layer:
//! - User records and their public projection
//! - Common error types
//! - Traits for user lookup and persistence
//! - Configuration management

pub mod config;

pub use config::{AppConfig, AuthConfig, ConfigError, LoggingConfig, SaltScheme, ServerConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Validation errors raised while building user records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
}

/// Columns that carry a uniqueness constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    Username,
    EmailAddress,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username => write!(f, "username"),
            Self::EmailAddress => write!(f, "email_address"),
        }
    }
}

/// Errors reported by user persistence backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("User with userid ({0}) doesn't exist")]
    NotFound(UserId),

    #[error("Unique constraint violated on {0}")]
    Conflict(UniqueField),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// User Models
// ============================================================================

/// Numeric user identifier assigned by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A user account as held by the persistence layer
///
/// `id` stays `None` until the record has been saved for the first time.
/// `password_hash` holds the stored credential bytes and is never
/// serialized; use [`UserPublic`] for anything that leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<UserId>,
    username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    email_address: String,
    pub password_hash: Vec<u8>,
}

impl User {
    /// Create a new, not yet persisted user
    pub fn new(
        username: impl Into<String>,
        first_name: Option<String>,
        last_name: Option<String>,
        email_address: impl Into<String>,
        password_hash: Vec<u8>,
    ) -> std::result::Result<Self, CoreError> {
        let mut user = Self {
            id: None,
            username: String::new(),
            first_name,
            last_name,
            email_address: String::new(),
            password_hash,
        };
        user.set_username(username)?;
        user.set_email_address(email_address)?;
        Ok(user)
    }

    /// Attach a persistence-assigned id
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) -> std::result::Result<(), CoreError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(CoreError::Validation("Username cannot be blank".to_string()));
        }
        self.username = username;
        Ok(())
    }

    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    pub fn set_email_address(
        &mut self,
        email_address: impl Into<String>,
    ) -> std::result::Result<(), CoreError> {
        let email_address = email_address.into();
        if email_address.trim().is_empty() {
            return Err(CoreError::Validation(
                "Email address cannot be blank".to_string(),
            ));
        }
        self.email_address = email_address;
        Ok(())
    }
}

/// User fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Option<UserId>,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: String,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email_address: user.email_address.clone(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Read access to stored users
#[async_trait::async_trait]
pub trait UserLookup: Send + Sync {
    /// Find a user by id
    async fn by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Find a user by exact username
    async fn by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Write access to stored users
#[async_trait::async_trait]
pub trait UserStore: UserLookup {
    /// Insert or update a user, assigning an id on first save
    ///
    /// Fails with [`StoreError::Conflict`] when the username or email
    /// address already belongs to another user.
    async fn save(&self, user: User) -> Result<User>;

    /// Remove a user
    async fn delete(&self, id: UserId) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================

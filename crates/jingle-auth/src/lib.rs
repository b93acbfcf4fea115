//! Password hashing and auth key management for Jingle.
//!
//! This crate provides:
//! - PBKDF2-HMAC-SHA1 password hashing compatible with existing stored credentials
//! - An in-memory, concurrent auth key store with expiry
//! - A bounded pool that keeps password hashing off the async executor
//! - [`AuthService`], which composes them into the login and authorize flows
//!
//! Auth keys live in process memory only. A restart invalidates every
//! session, and keys are not shared between processes.
//!
//! # Example
//!
//! ```rust,ignore
//! use jingle_auth::AuthService;
//! use jingle_core::AuthConfig;
//!
//! let auth = AuthService::new(&AuthConfig::default());
//!
//! // Signup: hash the password for storage
//! let stored = auth.hash("longenoughpw").await?;
//!
//! // Login: look the user up and issue an auth key
//! let outcome = auth.login("alice", "longenoughpw", &users).await?;
//!
//! // Later requests: check the key against the loaded user
//! auth.authorize(outcome.token.as_str(), &user)?;
//! ```

pub mod audit;
pub mod clock;
mod error;
pub mod keystore;
pub mod password;
pub mod pool;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use keystore::{AuthKeyStore, AuthToken, KeyGrant, DEFAULT_TTL, TOKEN_ALPHABET, TOKEN_LENGTH};
pub use password::{
    hash_password, validate_password_length, PasswordHash, PasswordHasher, MIN_PASSWORD_LENGTH,
};
pub use pool::HashingPool;
pub use service::{AuthService, LoginOutcome};

//! Error types for authentication operations.
//!
//! Every failure the core can report is a variant of [`AuthError`]; callers
//! match on the variant to choose a response, never on message text.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Password is shorter than the minimum length.
    #[error("Password must be a minimum of 8 characters long")]
    InvalidPassword,

    /// Unknown user, wrong password, or a password that could never match.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// Auth key is unknown or belongs to another user.
    #[error("Invalid auth key")]
    InvalidAuthKey,

    /// Auth key belongs to the user but its lifetime has run out.
    #[error("Expired auth key")]
    ExpiredAuthKey,

    /// Caller passed something the operation cannot work with.
    #[error("{0}")]
    InvalidArgument(String),

    /// The hashing pool and its queue are full.
    #[error("Too many concurrent password checks, try again later")]
    Overloaded,

    /// A hashing task or a collaborator failed unexpectedly.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Failures that should be answered as "not authenticated".
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::InvalidAuthKey | AuthError::ExpiredAuthKey
        )
    }

    /// Failures caused by bad caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidPassword | AuthError::InvalidArgument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(AuthError::InvalidCredentials.is_unauthorized());
        assert!(AuthError::ExpiredAuthKey.is_unauthorized());
        assert!(!AuthError::InvalidPassword.is_unauthorized());

        assert!(AuthError::InvalidPassword.is_validation());
        assert!(AuthError::InvalidArgument("x".into()).is_validation());
        assert!(!AuthError::Overloaded.is_validation());
    }

    #[test]
    fn test_auth_key_messages() {
        assert_eq!(AuthError::InvalidAuthKey.to_string(), "Invalid auth key");
        assert_eq!(AuthError::ExpiredAuthKey.to_string(), "Expired auth key");
    }

    #[test]
    fn test_password_message_matches_minimum() {
        assert_eq!(
            AuthError::InvalidPassword.to_string(),
            format!(
                "Password must be a minimum of {} characters long",
                crate::password::MIN_PASSWORD_LENGTH
            )
        );
    }
}

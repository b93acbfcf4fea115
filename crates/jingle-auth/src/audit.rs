//! Security audit logging for authentication events
//!
//! Provides structured audit logging for logins, auth key issuance,
//! authorization failures and key removal.
//!
//! All audit events are logged at INFO level with the "audit" target,
//! making them easy to filter and route to security monitoring systems.
//! Passwords are never recorded and auth keys only appear as a short
//! redacted prefix.
//!
//! # Example
//!
//! ```
//! use jingle_auth::audit::{audit_log, AuditEvent};
//! use jingle_core::UserId;
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: UserId(42),
//!     username: "alice".to_string(),
//! });
//! ```

use chrono::{DateTime, Utc};
use jingle_core::UserId;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful login
    LoginSuccess { user_id: UserId, username: String },

    /// Failed login; `reason` is internal only and never sent to the client
    LoginFailure { username: String, reason: String },

    /// Auth key issued
    KeyIssued {
        user_id: UserId,
        key_prefix: String,
        expires_at: DateTime<Utc>,
    },

    /// Auth key rejected during authorization
    AuthorizationFailure {
        user_id: UserId,
        key_prefix: String,
        reason: String,
    },

    /// Keys removed because their user went away
    KeysRevoked { user_id: UserId, count: usize },

    /// Expired keys swept from the store
    KeysEvicted { count: usize, remaining: usize },
}

/// Log a security audit event with structured fields
///
/// The event is also serialized to JSON under the `event` field for log
/// aggregators.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess { user_id, username } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure { username, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                "Login failed"
            );
        }
        AuditEvent::KeyIssued {
            user_id,
            key_prefix,
            expires_at,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                key = %key_prefix,
                expires_at = %expires_at,
                "Auth key issued"
            );
        }
        AuditEvent::AuthorizationFailure {
            user_id,
            key_prefix,
            reason,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                key = %key_prefix,
                reason = %reason,
                "Authorization failed"
            );
        }
        AuditEvent::KeysRevoked { user_id, count } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                count = %count,
                "Auth keys revoked"
            );
        }
        AuditEvent::KeysEvicted { count, remaining } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                count = %count,
                remaining = %remaining,
                "Expired auth keys evicted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginFailure {
            username: "alice".to_string(),
            reason: "wrong password".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"login_failure\""));
        assert!(json.contains("alice"));
    }

    #[test]
    fn test_key_issued_carries_only_prefix() {
        let event = AuditEvent::KeyIssued {
            user_id: UserId(42),
            key_prefix: "ABCD***".to_string(),
            expires_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "key_issued");
        assert_eq!(json["user_id"], 42);
        assert_eq!(json["key_prefix"], "ABCD***");
    }

    #[test]
    fn test_audit_log_all_events() {
        // only checks that logging never panics
        let events = vec![
            AuditEvent::LoginSuccess {
                user_id: UserId(1),
                username: "alice".to_string(),
            },
            AuditEvent::AuthorizationFailure {
                user_id: UserId(1),
                key_prefix: "ABCD***".to_string(),
                reason: "Expired auth key".to_string(),
            },
            AuditEvent::KeysRevoked {
                user_id: UserId(1),
                count: 2,
            },
            AuditEvent::KeysEvicted {
                count: 3,
                remaining: 0,
            },
        ];

        for event in &events {
            audit_log(event);
        }
    }
}

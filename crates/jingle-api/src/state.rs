//! Application state management

use crate::repository::InMemoryUserRepository;
use jingle_auth::AuthService;
use jingle_core::config::{AppConfig, AuthConfig};
use jingle_core::UserStore;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Password hashing and auth keys
    pub auth: AuthService,
    /// User persistence
    pub users: Arc<dyn UserStore>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state with config and an empty user table
    pub fn new(config: AppConfig) -> Self {
        let auth = AuthService::new(&config.auth);
        Self::with_parts(config, auth, Arc::new(InMemoryUserRepository::new()))
    }

    /// Assemble state from prebuilt parts
    pub fn with_parts(config: AppConfig, auth: AuthService, users: Arc<dyn UserStore>) -> Self {
        Self {
            config,
            auth,
            users,
            start_time: Instant::now(),
        }
    }

    /// Small hashing pool suited to tests
    pub fn for_testing() -> Self {
        let config = AppConfig {
            auth: AuthConfig {
                hash_workers: 2,
                hash_queue_depth: 16,
                ..AuthConfig::default()
            },
            ..AppConfig::default()
        };
        Self::new(config)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

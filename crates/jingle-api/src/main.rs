//! Jingle API Server
//!
//! REST server for Jingle user accounts.

use jingle_api::{create_router, state::AppState};
use jingle_core::config::{AppConfig, LoggingConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("JINGLE_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let eviction_interval = config.auth.eviction_interval_secs;

    // Create application state
    let state = Arc::new(AppState::new(config));

    if eviction_interval > 0 {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(eviction_interval));
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = state.auth.evict_expired();
                tracing::debug!(evicted, "Auth key sweep finished");
            }
        });
    }

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Jingle API Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "jingle_api={level},jingle_auth={level},audit=info,tower_http=debug",
            level = logging.level
        )
        .into()
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

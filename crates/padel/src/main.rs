//! Entry point for the padel scheduling and matchmaking service.

mod auth;
mod config;
mod db;
mod matchmaking;
mod notify;
mod server;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::AppConfig;
use crate::db::ClubDbManager;
use crate::notify::{NotificationDispatcher, SmtpMailer};
use crate::types::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = AppConfig::load_from_file(Path::new(&config_path))
        .map_err(|e| anyhow::anyhow!("Failed to load config from {config_path}: {e}"))?;

    let db = ClubDbManager::new(&config.database_path);
    info!("Opened database at {}", config.database_path);

    let mailer = SmtpMailer::connect(
        &config.smtp.host,
        config.smtp.port,
        config.smtp.username.clone(),
        config.smtp.password.clone(),
    )
    .context("Failed to configure SMTP transport")?;
    let dispatcher = NotificationDispatcher::new(Arc::new(mailer), config.smtp.from_address.clone());

    let state = Arc::new(AppState { db, dispatcher });
    let router = server::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install ctrl-c handler");
    info!("Shutdown signal received");
}

//! Salon - collaborative exhibit service
//!
//! Binds the exhibit API to a TCP port and runs periodic maintenance
//! against the shared database.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use salon_core::storage::Database;
use salon_net::{Server, SharedDb};

use config::{Config, ConfigError};

#[derive(Debug, thiserror::Error)]
enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] salon_core::Error),

    #[error("Network error: {0}")]
    Network(#[from] salon_net::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Salon");

    if let Err(e) = run().await {
        tracing::error!("Service failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServiceError> {
    let config_path = std::env::var_os("SALON_CONFIG").map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let db_path = config.db_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %db_path.display(), "Opening database");
    let db: SharedDb = Arc::new(Mutex::new(Database::open(&db_path)?));

    let server = Server::start(config.server.port, db.clone()).await?;
    tracing::info!(addr = %server.addr(), "Salon API listening");

    let sweeper = tokio::spawn(maintenance_loop(
        db,
        Duration::from_secs(config.maintenance.sweep_interval_secs),
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    sweeper.abort();
    server.shutdown();

    Ok(())
}

/// Clears out expired sessions and stale invitations on a fixed interval.
async fn maintenance_loop(db: SharedDb, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        let db = db.lock().await;

        match db.users().cleanup_expired_sessions() {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Removed expired sessions"),
            Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
        }

        match db.invitations().expire_stale() {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Expired stale invitations"),
            Err(e) => tracing::warn!(error = %e, "Invitation sweep failed"),
        }
    }
}

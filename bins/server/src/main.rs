//! SplitTrip API Server
//!
//! Main entry point for the SplitTrip backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use splittrip_api::{AppState, create_router};
use splittrip_db::LedgerStore;
use splittrip_shared::AppConfig;
use splittrip_shared::email::SmtpNotifier;
use splittrip_shared::jwt::JwtService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splittrip=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let store = LedgerStore::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    store.migrate().await.context("failed to apply migrations")?;
    info!("Database ready");

    let jwt_service = JwtService::new(&config.jwt);

    let notifier = SmtpNotifier::new(&config.email).context("failed to configure mail")?;
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        max_attempts = config.email.max_attempts,
        "Mail notifier configured"
    );

    let state = AppState::new(store, jwt_service, Arc::new(notifier), &config);
    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

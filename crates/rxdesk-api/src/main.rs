//! # rxdesk-api: Binary Entry Point
//!
//! Loads configuration and the seed dataset, then serves the API.

use rxdesk_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");

    if config.auth_token.is_none() && config.require_auth {
        tracing::warn!("AUTH_TOKEN not set; only session tokens from /v1/auth/login are accepted");
    }
    if !config.require_auth {
        tracing::warn!("RXDESK_REQUIRE_AUTH=false; unauthenticated requests run as admin");
    }

    let dataset = config.load_dataset().map_err(|e| {
        tracing::error!("Seed dataset failed to load: {e}");
        e
    })?;
    tracing::info!(
        drugs = dataset.drugs.len(),
        pharmacies = dataset.pharmacies.len(),
        prescriptions = dataset.prescriptions.len(),
        audit_logs = dataset.audit_logs.len(),
        "seed dataset loaded"
    );

    let port = config.port;
    let app = rxdesk_api::app(AppState::from_dataset(config, dataset));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("rxdesk API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

//! quickpoll server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::EnvFilter;

use quickpoll::api;
use quickpoll::app_state::AppState;
use quickpoll::config::{AppConfig, LogFormat};
use quickpoll::domain::{EventBus, PollStore};
use quickpoll::persistence::{PostgresPersistence, spawn_journal_writer};
use quickpoll::service::PollService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().context("invalid LISTEN_ADDR")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting quickpoll");

    // Build domain layer
    let store = Arc::new(PollStore::new());

    // Restore state and journal new changes when persistence is on
    let event_bus = if config.persistence_enabled {
        let persistence = PostgresPersistence::connect(&config)
            .await
            .context("connecting to database")?;
        persistence.migrate().await.context("running migrations")?;

        let polls = persistence.load_polls().await.context("loading polls")?;
        let votes = persistence.load_votes().await.context("loading votes")?;
        let restored = store.restore(polls, votes, Utc::now()).await;
        tracing::info!(polls = restored, "restored polls from database");

        let (event_bus, journal) =
            EventBus::with_journal(config.event_bus_capacity, config.journal_capacity);
        spawn_journal_writer(persistence, journal);
        event_bus
    } else {
        EventBus::new(config.event_bus_capacity)
    };

    tracing::info!(
        live_capacity = config.event_bus_capacity,
        journaled = event_bus.is_journaled(),
        "event bus ready"
    );

    // Build service layer
    let poll_service = Arc::new(PollService::new(
        store,
        event_bus,
        config.service_options(),
    ));

    // Build application state and router
    let app_state = AppState::new(poll_service, config.results_refresh());
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::application::dashboard_service::DashboardService;
use crate::application::reading_repository::ReadingRepository;
use crate::domain::scoring::ScoringEngine;
use crate::infrastructure::config::{
    ConfigChain, SourceKind, load_dashboard_config, load_influx_settings, load_local_tz,
    load_source_kind,
};
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::infrastructure::synthetic_repository::SyntheticRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, get_readings, health_check};

// Matches the 10-minute write cadence of the sensor.
const CACHE_TTL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let chain = ConfigChain::standard();
    let dashboard_config = load_dashboard_config()?;
    let local_tz = load_local_tz(&chain)?;

    // An empty calibration range is fatal here, not at render time.
    let engine = ScoringEngine::new(
        dashboard_config.calibration.clone(),
        dashboard_config.weights.clone(),
    )?;

    // Create repository (infrastructure layer) - one source per deployment
    let repository: Arc<dyn ReadingRepository> = match load_source_kind(&chain)? {
        SourceKind::Influx => Arc::new(InfluxRepository::new(
            load_influx_settings(&chain)?,
            local_tz,
        )?),
        SourceKind::Synthetic => Arc::new(SyntheticRepository::new(engine)),
    };

    // Create service (application layer) and state
    let dashboard_service = DashboardService::new(repository, dashboard_config, CACHE_TTL);
    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/readings", get(get_readings))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = "0.0.0.0:8080".parse()?;
    tracing::info!("starting plant-telemetry service on {addr}");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}

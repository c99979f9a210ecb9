//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::{create_pool, DbAdapter},
    config::Config,
    error::ApiError,
    web::{app_router, auth::purge_expired_sessions, pages::load_templates, state::AppState},
};
use cinema_core::ports::DatabaseService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = create_pool(config.database.clone(), config.db_max_connections).await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool, config.text_repair));
    if config.run_migrations {
        info!("Running database migrations...");
        db_adapter.run_migrations().await?;
        info!("Database migrations complete.");
    }

    let db_info = db_adapter.server_info().await?;
    info!(
        "Database ready: {} ({} movies)",
        db_info.version, db_info.movie_count
    );
    info!("Text repair mode: {}", config.text_repair);

    // --- 3. Build the Shared AppState ---
    let templates = load_templates()
        .map_err(|e| ApiError::Internal(format!("Failed to load page templates: {}", e)))?;
    let db: Arc<dyn DatabaseService> = db_adapter;
    let app_state = Arc::new(AppState {
        db: db.clone(),
        config: config.clone(),
        templates: Arc::new(templates),
    });

    // --- 4. Start Background Cleanup ---
    tokio::spawn(purge_expired_sessions(
        db,
        Duration::from_secs(config.session_purge_interval_secs),
    ));

    // --- 5. Create the Web Router & Start the Server ---
    let app = app_router(app_state);

    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}

//! WashTrack - Chemical Inventory Server
//!
//! Tracks car-wash chemical stock across the shelf and the line, with unit
//! conversion, low-stock alerts, a restock request workflow, and best-effort
//! spreadsheet export for reporting.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod models;
mod routes;
mod services;

pub use config::Config;

use external::SheetsClient;
use services::{
    catalog::CatalogService, cleanup, ledger::LedgerService, mirror::MirrorService,
    requests::RequestService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub sheets: SheetsClient,
}

impl AppState {
    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.db.clone())
    }

    pub fn mirror(&self) -> MirrorService {
        MirrorService::new(self.db.clone(), self.sheets.clone())
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.db.clone(), self.mirror())
    }

    pub fn requests(&self) -> RequestService {
        RequestService::new(self.db.clone(), self.mirror())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "washtrack_backend=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting WashTrack Chemical Inventory Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    // The spreadsheet client is built once here and injected everywhere
    let sheets = SheetsClient::new(&config.sheets)?;

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        sheets,
    };

    // Best-effort spreadsheet backfill; failures never block startup
    if state.sheets.enabled() {
        let mirror = state.mirror();
        tokio::spawn(async move {
            match mirror.startup_backfill().await {
                Ok(()) => tracing::info!("spreadsheet headers ensured and state backfilled"),
                Err(e) => tracing::error!("spreadsheet backfill failed: {}", e),
            }
        });
    } else {
        tracing::info!("Spreadsheet export is disabled");
    }

    // Recurring activity-log retention sweep
    cleanup::spawn_retention_sweeper(
        state.db.clone(),
        chrono::Duration::hours(config.retention.activity_log_hours),
        Duration::from_secs(config.retention.sweep_interval_minutes * 60),
    );

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "WashTrack Chemical Inventory API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

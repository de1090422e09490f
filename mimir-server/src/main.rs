//! Mimir Ingestion Server
//!
//! Receives generated scenarios over the push transport, strips ground
//! truth, submits the redacted payload to the reasoning oracle, and records
//! the verdict alongside the concealed truth.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     MIMIR SERVER                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────┐ │
//! │  │ Push     │──▶│ Redactor │──▶│ Oracle Client         │ │
//! │  │ Endpoint │   │          │   │ (chat completion)     │ │
//! │  └──────────┘   └──────────┘   └──────────┬────────────┘ │
//! │                                           ▼              │
//! │                                    ┌─────────────┐       │
//! │                                    │ PostgreSQL  │       │
//! │                                    └─────────────┘       │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod envelope;
mod error;
mod handlers;
mod oracle;
mod pipeline;
mod redact;
mod store;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::oracle::{load_system_instruction, HttpOracle, Oracle};
use crate::pipeline::Pipeline;
use crate::store::{PgVerdictStore, VerdictStore};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mimir_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Mimir server starting...");
    tracing::info!(
        "Database: {}",
        config.database_url.split('@').last().unwrap_or("***")
    );
    tracing::info!("Oracle: {} ({})", config.oracle_url, config.oracle_model);

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    // Composition root: collaborators are constructed once and injected.
    let store: Arc<dyn VerdictStore> = Arc::new(PgVerdictStore::new(pool));
    let oracle: Arc<dyn Oracle> =
        Arc::new(HttpOracle::from_config(&config).expect("Failed to create oracle client"));
    let system_instruction = load_system_instruction(config.system_prompt_path.as_deref());
    let blocklist = redact::blocklist(&config.redaction_extra_keys);

    let state = AppState {
        pipeline: Arc::new(Pipeline::new(
            oracle,
            store.clone(),
            blocklist,
            system_instruction,
        )),
        store,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn VerdictStore>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::ingest::push))
        .route("/health", get(handlers::health::check))
        .route("/api/results", get(handlers::results::list))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

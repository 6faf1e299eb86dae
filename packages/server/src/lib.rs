//! NoteSpace HTTP server
//!
//! This crate exposes the note access functions as a small JSON API.
//!
//! # Architecture
//!
//! Endpoints live in modules that each contribute a `Router`, merged in
//! [`create_router`]. All handlers share one [`AppState`] holding the
//! `NoteService`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin notespace-server
//!
//! # Custom port and database
//! NOTESPACE_PORT=3002 NOTESPACE_DB_PATH=/tmp/notes.db cargo run --bin notespace-server
//! ```
//!
//! # Security
//!
//! - No authentication; the owner header only partitions data
//! - CORS restricted to the configured origins

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use notespace_core::db::{DatabaseService, TursoStore};
use notespace_core::models::OWNER_HEADER;
use notespace_core::services::NoteService;

pub mod config;
mod http_error;
mod note_endpoints;

pub use config::{ConfigError, ServerConfig};
pub use http_error::HttpError;
pub use note_endpoints::{HealthStatus, Owner};

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseService>,
    pub note_service: Arc<NoteService>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open the database and build the services described by `config`
    pub async fn initialize(config: ServerConfig) -> anyhow::Result<Self> {
        let db_path = config.resolved_database_path()?;
        tracing::info!("📦 Database: {}", db_path.display());

        let db = Arc::new(DatabaseService::new(db_path).await?);
        let store = Arc::new(TursoStore::new(db.clone()).await?);
        let note_service = NoteService::with_limits(store, config.note_limits());

        Ok(Self {
            db,
            note_service: Arc::new(note_service),
            config: Arc::new(config),
        })
    }
}

/// Create the main application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allow_origins);

    Router::new()
        .merge(note_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Create CORS layer
///
/// Origins that are not valid header values are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(OWNER_HEADER),
        ])
        .allow_credentials(false)
}

/// Forward domain events to the log
fn spawn_event_logger(note_service: &NoteService) {
    let mut rx = note_service.subscribe_to_events();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    tracing::debug!(
                        event = event.event_type(),
                        owner_id = event.owner_id(),
                        "Domain event"
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Serve `state` on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    spawn_event_logger(&state.note_service);
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Start the HTTP server and run until Ctrl-C
///
/// # Errors
///
/// Returns error if the database cannot be opened or the port cannot be bound.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let state = AppState::initialize(config).await?;
    let db = state.db.clone();

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 NoteSpace server listening on http://{}", addr);
    tracing::info!("📡 CORS enabled for {:?}", state.config.cors_allow_origins);

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a signal handler, keep serving until the process is killed
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("🛑 Shutting down");
    })
    .await?;

    db.db_close().await?;
    Ok(())
}

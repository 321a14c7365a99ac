//! HTTP decode service.
//!
//! Exposes `POST /decode` (barcode recognition on a base64 image) and
//! `POST /save-json` (persist a scan container to disk). CORS is open to
//! every origin and request bodies are capped by
//! [`ServerConfig::max_body_bytes`].

pub mod error;
pub mod handlers;

use std::fmt;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::barcode::{self, BarcodeEngine};
use crate::config::{Config, ServerConfig};
use crate::error::Result;
use crate::scans::ScanWriter;

pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    engine: &'static dyn BarcodeEngine,
    scans: ScanWriter,
}

impl AppState {
    /// State backed by the process-wide barcode engine.
    #[must_use]
    pub fn new(scans: ScanWriter) -> Self {
        Self::with_engine(barcode::engine(), scans)
    }

    /// State backed by an explicit engine.
    #[must_use]
    pub fn with_engine(engine: &'static dyn BarcodeEngine, scans: ScanWriter) -> Self {
        Self { engine, scans }
    }

    /// Writer used by `POST /save-json`.
    #[must_use]
    pub fn scans(&self) -> &ScanWriter {
        &self.scans
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("scans", &self.scans)
            .finish_non_exhaustive()
    }
}

/// Build the service router.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/decode", post(handlers::decode))
        .route("/save-json", post(handlers::save_json))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::new(ScanWriter::new(&config.scans.output_dir));
    let scans_dir = state.scans().dir().display().to_string();
    let app = build_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    info!(
        "Decoder listening on {} (scans -> {scans_dir})",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Decoder stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

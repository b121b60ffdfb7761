//! Paylens Prediction API
//!
//! HTTP backend scoring employee records, built with Axum.
//!
//! # Endpoints
//!
//! ## Prediction
//! - `POST /predict` - Score an employee record
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use paylens::api::{serve, ApiConfig, AppState};
//! use paylens::model::LogisticModel;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::default();
//!     let state = AppState::new(Arc::new(LogisticModel::baseline()), config.clone());
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::model::{LogisticModel, ModelError, Predictor};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/predict", post(routes::predict::predict))
        .layer(DefaultBodyLimit::max(body_limit))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        // The dashboard may be served from another origin
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Load the configured model, or the built-in baseline
pub fn load_predictor(config: &ApiConfig) -> Result<Arc<dyn Predictor>, ModelError> {
    let model = match &config.model_path {
        Some(path) => {
            let model = LogisticModel::load(path)?;
            tracing::info!("Loaded model '{}' from {:?}", model.name(), path);
            model
        }
        None => {
            tracing::info!("No model path configured, using built-in baseline");
            LogisticModel::baseline()
        }
    };
    Ok(Arc::new(model))
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Paylens API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Paylens API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

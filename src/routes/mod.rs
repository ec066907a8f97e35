//! Rutas HTTP
//!
//! `create_router` monta todos los routers bajo `/api` junto con los
//! endpoints públicos de salud y métricas.

pub mod auth_routes;
pub mod fleet_routes;
pub mod geofence_routes;
pub mod map_routes;
pub mod tracking_routes;
pub mod vehicle_routes;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_layer;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes::auth_routes(&state))
        .nest("/vehicles", vehicle_routes::create_vehicle_router(&state))
        .nest("/geofences", geofence_routes::create_geofence_router(&state))
        .nest("/map", map_routes::create_map_router(&state))
        .nest("/tracking", tracking_routes::create_tracking_router(&state))
        .nest("/fleet", fleet_routes::create_fleet_router(&state));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let tracking = state.tracking.status().await;
    Json(json!({
        "status": "healthy",
        "service": "fleet-tracking",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "map_attached": state.reconciler.is_attached().await,
        "tracking": tracking,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Exposición Prometheus de los contadores de los bucles
async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(format!("Error renderizando métricas: {}", e)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

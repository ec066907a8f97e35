use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};

use serde::Serialize;

use crate::dto::api_response::ApiResponse;
use crate::dto::map_dto::LoopActionResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::models::auth::UserRole;
use crate::services::geofence_evaluator::EvaluationReport;
use crate::services::refresh_loop::TickOutcome;
use crate::services::tracking_runtime::{LoopKind, TrackingStatus};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

pub fn create_tracking_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/:loop_kind/start", post(start_loop))
        .route("/:loop_kind/stop", post(stop_loop))
        .route("/:loop_kind/tick", post(tick_loop))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn parse_kind(value: &str) -> Result<LoopKind, AppError> {
    LoopKind::from_str(value).ok_or_else(|| bad_request_error(&format!("Unknown loop '{}'", value)))
}

async fn status(State(state): State<AppState>) -> Json<TrackingStatus> {
    Json(state.tracking.status().await)
}

async fn start_loop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(loop_kind): Path<String>,
) -> Result<Json<ApiResponse<LoopActionResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let kind = parse_kind(&loop_kind)?;

    let changed = state.tracking.start(kind).await;
    let message = if changed { "Bucle iniciado" } else { "El bucle ya estaba en marcha" };

    Ok(Json(ApiResponse::success_with_message(
        LoopActionResponse {
            loop_kind: kind,
            changed,
            status: state.tracking.status().await,
        },
        message,
    )))
}

async fn stop_loop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(loop_kind): Path<String>,
) -> Result<Json<ApiResponse<LoopActionResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let kind = parse_kind(&loop_kind)?;

    let changed = state.tracking.stop(kind).await;
    let message = if changed { "Bucle detenido" } else { "El bucle no estaba en marcha" };

    Ok(Json(ApiResponse::success_with_message(
        LoopActionResponse {
            loop_kind: kind,
            changed,
            status: state.tracking.status().await,
        },
        message,
    )))
}

#[derive(Serialize)]
#[serde(untagged)]
enum TickResponse {
    Refresh(TickOutcome),
    Geofence(EvaluationReport),
}

/// Un tick manual, fuera del temporizador
async fn tick_loop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(loop_kind): Path<String>,
) -> Result<Json<TickResponse>, AppError> {
    user.require(UserRole::FleetManager)?;

    let response = match parse_kind(&loop_kind)? {
        LoopKind::Refresh => TickResponse::Refresh(state.tracking.refresh_now().await),
        LoopKind::Geofence => TickResponse::Geofence(state.tracking.evaluate_now().await),
    };
    Ok(Json(response))
}

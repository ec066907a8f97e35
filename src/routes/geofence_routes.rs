use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::geofence_controller::GeofenceController;
use crate::dto::api_response::ApiResponse;
use crate::dto::geofence_dto::{
    CreateGeofenceRequest, GeofenceDeletedResponse, UpdateGeofenceRequest, ViolationListResponse, ViolationQuery,
};
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::models::auth::UserRole;
use crate::models::geofence::Geofence;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_geofence_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_geofences).post(create_geofence))
        .route("/violations", get(list_violations).delete(clear_violations))
        .route(
            "/:id",
            get(get_geofence).patch(update_geofence).delete(delete_geofence),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

async fn create_geofence(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateGeofenceRequest>,
) -> Result<Json<ApiResponse<Geofence>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let controller = GeofenceController::new(&state);
    Ok(Json(controller.create(request).await?))
}

async fn list_geofences(State(state): State<AppState>) -> Json<Vec<Geofence>> {
    Json(GeofenceController::new(&state).list().await)
}

async fn get_geofence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Geofence>, AppError> {
    let controller = GeofenceController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_geofence(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGeofenceRequest>,
) -> Result<Json<ApiResponse<Geofence>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let controller = GeofenceController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_geofence(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GeofenceDeletedResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let controller = GeofenceController::new(&state);
    Ok(Json(controller.delete(id).await?))
}

async fn list_violations(
    State(state): State<AppState>,
    Query(query): Query<ViolationQuery>,
) -> Json<ViolationListResponse> {
    Json(GeofenceController::new(&state).violations(query).await)
}

async fn clear_violations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<usize>>, AppError> {
    user.require(UserRole::FleetManager)?;
    Ok(Json(GeofenceController::new(&state).clear_violations().await))
}

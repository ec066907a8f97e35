use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::api_response::ApiResponse;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, FleetEntry, FocusQuery, ReplaceFleetResponse, UpdateVehicleRequest,
    VehicleListQuery, VehicleMutationResponse, VehicleResponse,
};
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::models::auth::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_vehicles).post(create_vehicle).put(replace_vehicles),
        )
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleMutationResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let controller = VehicleController::new(&state);
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.list(query.status).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleMutationResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let controller = VehicleController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleMutationResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let controller = VehicleController::new(&state);
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn replace_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<FocusQuery>,
    Json(entries): Json<Vec<FleetEntry>>,
) -> Result<Json<ApiResponse<ReplaceFleetResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;
    let controller = VehicleController::new(&state);
    let response = controller.replace_all(entries, query.focus).await?;
    Ok(Json(response))
}

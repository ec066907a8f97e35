use axum::{extract::State, middleware, routing::get, Json, Router};

use crate::dto::api_response::ApiResponse;
use crate::middleware::auth::auth_middleware;
use crate::services::fleet_service::FleetSummary;
use crate::state::AppState;

pub fn create_fleet_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

async fn summary(State(state): State<AppState>) -> Json<ApiResponse<FleetSummary>> {
    Json(ApiResponse::success(state.fleet.summary().await))
}

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::Value;

use crate::dto::api_response::ApiResponse;
use crate::dto::map_dto::{FocusRequest, FocusResponse, MapConfigResponse, MapStateResponse, SurfaceResponse};
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::models::auth::UserRole;
use crate::services::demo_fleet::DEFAULT_CENTER;
use crate::services::map_surface::MapSurface;
use crate::state::AppState;
use crate::utils::errors::AppError;

const DEFAULT_ZOOM: f64 = 12.0;

pub fn create_map_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/config", get(map_config))
        .route("/markers", get(markers))
        .route("/state", get(map_state))
        .route("/focus", post(focus_vehicle))
        .route("/attach", post(attach_map))
        .route("/detach", post(detach_map))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

async fn map_config(State(state): State<AppState>) -> Json<MapConfigResponse> {
    Json(MapConfigResponse {
        mapbox_token: state.config.mapbox_token.clone(),
        default_center: DEFAULT_CENTER,
        default_zoom: DEFAULT_ZOOM,
        popup_reopen_delay_ms: state.config.popup_reopen_delay_ms,
        refresh_interval_ms: state.config.refresh_interval_ms,
    })
}

/// Marcadores como FeatureCollection GeoJSON
async fn markers(State(state): State<AppState>) -> Json<Value> {
    Json(state.layer.feature_collection().await)
}

async fn map_state(State(state): State<AppState>) -> Json<MapStateResponse> {
    let open_popup = state
        .layer
        .markers()
        .await
        .into_iter()
        .find(|m| m.popup_open)
        .map(|m| m.vehicle_id);

    Json(MapStateResponse {
        attached: state.reconciler.is_attached().await,
        markers: state.reconciler.marker_count().await,
        focus: state.layer.current_focus().await,
        open_popup,
    })
}

async fn focus_vehicle(
    State(state): State<AppState>,
    Json(request): Json<FocusRequest>,
) -> Json<ApiResponse<FocusResponse>> {
    let vehicle = state.store.get(request.vehicle_id).await;
    // El popup se reabre en segundo plano tras el retardo configurado
    let (focus, _popup_task) = state.reconciler.focus(vehicle.as_ref()).await;

    Json(ApiResponse::success(FocusResponse {
        vehicle_id: request.vehicle_id,
        focus,
    }))
}

/// Monta el mapa y crea los marcadores de toda la flota
async fn attach_map(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<SurfaceResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;

    let surface: std::sync::Arc<dyn MapSurface> = state.layer.clone();
    let (markers_removed, markers_created) = {
        let vehicles = state.store.read().await;
        let removed = state.reconciler.attach(surface).await;
        let created = match state.reconciler.rebuild(&vehicles, None).await {
            Ok(report) => report.created,
            Err(_) => 0,
        };
        (removed, created)
    };
    state.metrics.markers.set(state.reconciler.marker_count().await as i64);

    Ok(Json(ApiResponse::success_with_message(
        SurfaceResponse {
            attached: true,
            markers_removed,
            markers_created,
        },
        "Mapa montado",
    )))
}

/// Desmonta el mapa: se retiran todos los marcadores y el refresco se omite
async fn detach_map(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<SurfaceResponse>>, AppError> {
    user.require(UserRole::FleetManager)?;

    let markers_removed = state.reconciler.detach().await;
    state.metrics.markers.set(0);

    Ok(Json(ApiResponse::success_with_message(
        SurfaceResponse {
            attached: false,
            markers_removed,
            markers_created: 0,
        },
        "Mapa desmontado",
    )))
}

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::geofence_dto::{
    CreateGeofenceRequest, GeofenceDeletedResponse, UpdateGeofenceRequest, ViolationListResponse, ViolationQuery,
};
use crate::models::geofence::Geofence;
use crate::services::geofence_service::GeofenceService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct GeofenceController {
    geofences: Arc<GeofenceService>,
}

impl GeofenceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            geofences: state.geofences.clone(),
        }
    }

    pub async fn create(&self, request: CreateGeofenceRequest) -> Result<ApiResponse<Geofence>, AppError> {
        request.validate()?;
        let geofence = self.geofences.create(request.into_geofence()).await;
        Ok(ApiResponse::success_with_message(geofence, "Geocerca creada exitosamente"))
    }

    pub async fn list(&self) -> Vec<Geofence> {
        self.geofences.list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Geofence, AppError> {
        self.geofences.get(id).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateGeofenceRequest) -> Result<ApiResponse<Geofence>, AppError> {
        let geofence = self.geofences.update(id, request).await?;
        Ok(ApiResponse::success_with_message(geofence, "Geocerca actualizada exitosamente"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<GeofenceDeletedResponse>, AppError> {
        let geofence = self.geofences.delete(id).await?;
        Ok(ApiResponse::success_with_message(
            GeofenceDeletedResponse {
                id: geofence.id,
                name: geofence.name,
            },
            "Geocerca eliminada exitosamente",
        ))
    }

    pub async fn violations(&self, query: ViolationQuery) -> ViolationListResponse {
        ViolationListResponse {
            capacity: self.geofences.violation_capacity(),
            violations: self.geofences.violations(query.geofence_id, query.limit).await,
        }
    }

    pub async fn clear_violations(&self) -> ApiResponse<usize> {
        let cleared = self.geofences.clear_violations().await;
        ApiResponse::success_with_message(cleared, format!("{} violaciones eliminadas", cleared))
    }
}

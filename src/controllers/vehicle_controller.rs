use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, FleetEntry, ReplaceFleetResponse, UpdateVehicleRequest, VehicleMutationResponse,
    VehicleResponse,
};
use crate::models::vehicle::VehicleStatus;
use crate::services::fleet_service::FleetService;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

pub struct VehicleController {
    fleet: Arc<FleetService>,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            fleet: state.fleet.clone(),
        }
    }

    pub async fn create(
        &self,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleMutationResponse>, AppError> {
        request.validate()?;

        let (vehicle, marker) = self.fleet.create(request.into_vehicle()).await?;

        Ok(ApiResponse::success_with_message(
            VehicleMutationResponse {
                vehicle: vehicle.into(),
                marker,
            },
            "Vehículo creado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<VehicleResponse, AppError> {
        Ok(self.fleet.get(id).await?.into())
    }

    pub async fn list(&self, status: Option<String>) -> Result<Vec<VehicleResponse>, AppError> {
        let status = match status.as_deref() {
            None | Some("") => None,
            Some(value) => Some(
                VehicleStatus::from_str(value)
                    .ok_or_else(|| bad_request_error(&format!("Unknown vehicle status '{}'", value)))?,
            ),
        };

        let vehicles = self.fleet.list(status).await;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleMutationResponse>, AppError> {
        request.validate()?;

        let (vehicle, marker) = self.fleet.update(id, request).await?;

        Ok(ApiResponse::success_with_message(
            VehicleMutationResponse {
                vehicle: vehicle.into(),
                marker,
            },
            "Vehículo actualizado exitosamente",
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<VehicleMutationResponse>, AppError> {
        let (vehicle, marker) = self.fleet.delete(id).await?;
        Ok(ApiResponse::success_with_message(
            VehicleMutationResponse {
                vehicle: vehicle.into(),
                marker,
            },
            "Vehículo eliminado exitosamente",
        ))
    }

    /// Sustituye la flota completa; `focus` centra el mapa en un vehículo
    pub async fn replace_all(
        &self,
        entries: Vec<FleetEntry>,
        focus: Option<Uuid>,
    ) -> Result<ApiResponse<ReplaceFleetResponse>, AppError> {
        for entry in &entries {
            entry.validate()?;
        }

        let vehicles: Vec<_> = entries.into_iter().map(FleetEntry::into_vehicle).collect();
        let count = vehicles.len();

        let response = match self.fleet.replace_fleet(vehicles, focus).await? {
            Ok(report) => ReplaceFleetResponse {
                vehicles: count,
                markers_removed: report.removed,
                markers_created: report.created,
                not_mappable: report.not_mappable,
                focus: report.focus,
                skipped: None,
            },
            Err(reason) => ReplaceFleetResponse {
                vehicles: count,
                markers_removed: 0,
                markers_created: 0,
                not_mappable: Vec::new(),
                focus: None,
                skipped: Some(reason),
            },
        };

        Ok(ApiResponse::success_with_message(
            response,
            format!("Flota sustituida: {} vehículos", count),
        ))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::{Coordinates, Vehicle, VehicleStatus};
use crate::services::marker_reconciler::{FocusOutcome, SkipReason, SyncOutcome};
use crate::utils::validation::validate_license_plate;

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,
    #[validate(length(min = 1, max = 100))]
    pub driver_name: Option<String>,
    pub status: Option<VehicleStatus>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub fuel_level: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub battery_level: Option<f64>,
    #[validate(range(min = -40.0, max = 200.0))]
    pub engine_temperature: Option<f64>,
}

impl CreateVehicleRequest {
    pub fn into_vehicle(self) -> Vehicle {
        let mut vehicle = Vehicle::new(self.license_plate.trim(), self.status.unwrap_or(VehicleStatus::Idle));
        vehicle.driver_name = self.driver_name;
        vehicle.latitude = self.latitude;
        vehicle.longitude = self.longitude;
        vehicle.fuel_level = self.fuel_level;
        vehicle.battery_level = self.battery_level;
        vehicle.engine_temperature = self.engine_temperature;
        vehicle
    }
}

// Request para actualizar un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(custom = "validate_license_plate")]
    pub license_plate: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub driver_name: Option<String>,
    pub status: Option<VehicleStatus>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    /// Quita la posición: el vehículo deja de ser mapeable
    #[serde(default)]
    pub clear_coordinates: bool,
    #[validate(range(min = 0.0))]
    pub speed: Option<f64>,
    #[validate(range(min = 0.0, max = 360.0))]
    pub heading: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub fuel_level: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub battery_level: Option<f64>,
    #[validate(range(min = -40.0, max = 200.0))]
    pub engine_temperature: Option<f64>,
}

impl UpdateVehicleRequest {
    /// ¿El cambio afecta al icono o al popup del marcador?
    pub fn changes_marker_content(&self) -> bool {
        self.license_plate.is_some()
            || self.driver_name.is_some()
            || self.status.is_some()
            || self.fuel_level.is_some()
            || self.battery_level.is_some()
    }

    pub fn apply(self, vehicle: &mut Vehicle) {
        if let Some(plate) = self.license_plate {
            vehicle.license_plate = plate.trim().to_string();
        }
        if let Some(driver_name) = self.driver_name {
            vehicle.driver_name = Some(driver_name);
        }
        if let Some(status) = self.status {
            vehicle.status = status;
        }
        if self.clear_coordinates {
            vehicle.set_coordinates(None);
        } else {
            if self.latitude.is_some() {
                vehicle.latitude = self.latitude;
            }
            if self.longitude.is_some() {
                vehicle.longitude = self.longitude;
            }
        }
        if self.speed.is_some() {
            vehicle.speed = self.speed;
        }
        if self.heading.is_some() {
            vehicle.heading = self.heading;
        }
        if self.fuel_level.is_some() {
            vehicle.fuel_level = self.fuel_level;
        }
        if self.battery_level.is_some() {
            vehicle.battery_level = self.battery_level;
        }
        if self.engine_temperature.is_some() {
            vehicle.engine_temperature = self.engine_temperature;
        }
    }
}

// Entrada de la lista completa de vehículos: {id, lat, lng, status, fuel_level, battery_level}
#[derive(Debug, Deserialize, Validate)]
pub struct FleetEntry {
    pub id: Option<Uuid>,
    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,
    pub driver_name: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
    pub status: VehicleStatus,
    #[validate(range(min = 0.0, max = 100.0))]
    pub fuel_level: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub battery_level: Option<f64>,
}

impl FleetEntry {
    pub fn into_vehicle(self) -> Vehicle {
        let mut vehicle = Vehicle::new(self.license_plate.trim(), self.status);
        if let Some(id) = self.id {
            vehicle.id = id;
        }
        vehicle.driver_name = self.driver_name;
        vehicle.latitude = self.lat;
        vehicle.longitude = self.lng;
        vehicle.fuel_level = self.fuel_level;
        vehicle.battery_level = self.battery_level;
        vehicle
    }
}

#[derive(Debug, Deserialize)]
pub struct VehicleListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FocusQuery {
    pub focus: Option<Uuid>,
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub license_plate: String,
    pub driver_name: Option<String>,
    pub status: VehicleStatus,
    pub coordinates: Option<Coordinates>,
    pub mappable: bool,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub fuel_level: Option<f64>,
    pub battery_level: Option<f64>,
    pub engine_temperature: Option<f64>,
    pub last_update: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        let coordinates = vehicle.coordinates();
        Self {
            id: vehicle.id,
            license_plate: vehicle.license_plate,
            driver_name: vehicle.driver_name,
            status: vehicle.status,
            mappable: coordinates.is_some(),
            coordinates,
            speed: vehicle.speed,
            heading: vehicle.heading,
            fuel_level: vehicle.fuel_level,
            battery_level: vehicle.battery_level,
            engine_temperature: vehicle.engine_temperature,
            last_update: vehicle.last_update,
        }
    }
}

// Vehículo + efecto sobre su marcador
#[derive(Debug, Serialize)]
pub struct VehicleMutationResponse {
    pub vehicle: VehicleResponse,
    pub marker: SyncOutcome,
}

#[derive(Debug, Serialize)]
pub struct ReplaceFleetResponse {
    pub vehicles: usize,
    pub markers_removed: usize,
    pub markers_created: usize,
    pub not_mappable: Vec<Uuid>,
    pub focus: Option<FocusOutcome>,
    /// Presente si el mapa no estaba disponible para reconstruir
    pub skipped: Option<SkipReason>,
}

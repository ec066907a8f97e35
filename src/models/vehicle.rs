//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle tal como lo guarda el
//! `LocationStore`, junto con sus coordenadas y su estado operativo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Par latitud/longitud en grados decimales
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Coordenadas finitas y dentro de los rangos geográficos
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Desplaza la posición y la mantiene dentro de los rangos válidos
    pub fn offset(&self, dlat: f64, dlng: f64) -> Self {
        Self {
            lat: (self.lat + dlat).clamp(-90.0, 90.0),
            lng: (self.lng + dlng).clamp(-180.0, 180.0),
        }
    }

    /// Formato GeoJSON: [longitude, latitude]
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Estado del vehículo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Idle,
    Maintenance,
    Offline,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Idle => "idle",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Offline => "offline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(VehicleStatus::Active),
            "idle" => Some(VehicleStatus::Idle),
            "maintenance" => Some(VehicleStatus::Maintenance),
            "offline" => Some(VehicleStatus::Offline),
            _ => None,
        }
    }

    /// Color del icono del marcador en el mapa
    pub fn marker_color(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "#22c55e",
            VehicleStatus::Idle => "#eab308",
            VehicleStatus::Maintenance => "#f97316",
            VehicleStatus::Offline => "#6b7280",
        }
    }
}

/// Vehicle principal - el registro que muta el bucle de refresco
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub driver_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub fuel_level: Option<f64>,
    pub battery_level: Option<f64>,
    pub engine_temperature: Option<f64>,
    pub status: VehicleStatus,
    pub last_update: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(license_plate: impl Into<String>, status: VehicleStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            license_plate: license_plate.into(),
            driver_name: None,
            latitude: None,
            longitude: None,
            speed: None,
            heading: None,
            fuel_level: None,
            battery_level: None,
            engine_temperature: None,
            status,
            last_update: Utc::now(),
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.set_coordinates(Some(coordinates));
        self
    }

    /// Posición mapeable; `None` si falta lat/lng o está fuera de rango
    pub fn coordinates(&self) -> Option<Coordinates> {
        let coordinates = Coordinates::new(self.latitude?, self.longitude?);
        coordinates.is_valid().then_some(coordinates)
    }

    pub fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
        self.latitude = coordinates.map(|c| c.lat);
        self.longitude = coordinates.map(|c| c.lng);
    }

    pub fn is_mappable(&self) -> bool {
        self.coordinates().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == VehicleStatus::Active
    }
}

/// Muestra de telemetría enviada al destino de actualizaciones de posición
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub vehicle_id: Uuid,
    pub coordinates: Coordinates,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub heading: f64,
}

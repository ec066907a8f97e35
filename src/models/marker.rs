//! Modelo de marcador del mapa
//!
//! Un marcador es el handle visual de un vehículo en la superficie del mapa.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vehicle::{Coordinates, Vehicle, VehicleStatus};

/// Contenido del popup de información, congelado al crear el marcador
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupContent {
    pub title: String,
    pub status: VehicleStatus,
    pub driver_name: Option<String>,
    pub fuel_level: Option<f64>,
    pub battery_level: Option<f64>,
}

impl PopupContent {
    pub fn for_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            title: vehicle.license_plate.clone(),
            status: vehicle.status,
            driver_name: vehicle.driver_name.clone(),
            fuel_level: vehicle.fuel_level,
            battery_level: vehicle.battery_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub vehicle_id: Uuid,
    pub position: Coordinates,
    pub color: String,
    pub popup: PopupContent,
    pub popup_open: bool,
}

impl Marker {
    /// Construye el marcador de un vehículo con coordenadas válidas
    pub fn for_vehicle(vehicle: &Vehicle, position: Coordinates) -> Self {
        Self {
            vehicle_id: vehicle.id,
            position,
            color: vehicle.status.marker_color().to_string(),
            popup: PopupContent::for_vehicle(vehicle),
            popup_open: false,
        }
    }

    /// Feature GeoJSON para el front-end de Mapbox
    pub fn to_feature(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "id": self.vehicle_id,
            "geometry": {
                "type": "Point",
                "coordinates": self.position.to_lng_lat(),
            },
            "properties": {
                "vehicle_id": self.vehicle_id,
                "color": self.color,
                "popup_open": self.popup_open,
                "title": self.popup.title,
                "status": self.popup.status,
                "driver_name": self.popup.driver_name,
                "fuel_level": self.popup.fuel_level,
                "battery_level": self.popup.battery_level,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_uses_lng_lat_order() {
        let vehicle = Vehicle::new("AB-1234", VehicleStatus::Idle)
            .with_coordinates(Coordinates::new(13.7244, 100.5332));
        let marker = Marker::for_vehicle(&vehicle, Coordinates::new(13.7244, 100.5332));

        let feature = marker.to_feature();
        assert_eq!(feature["geometry"]["coordinates"][0], 100.5332);
        assert_eq!(feature["geometry"]["coordinates"][1], 13.7244);
        assert_eq!(feature["properties"]["color"], VehicleStatus::Idle.marker_color());
        assert_eq!(feature["properties"]["title"], "AB-1234");
    }
}

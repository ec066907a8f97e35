use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::geofence::{Geofence, GeofenceMode, ViolationEvent};
use crate::models::vehicle::Coordinates;
use crate::utils::validation::validate_not_empty;

// Request para crear una geocerca
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGeofenceRequest {
    #[validate(custom = "validate_not_empty", length(max = 100))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub center_lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub center_lng: f64,
    #[validate(range(min = 1.0, max = 100000.0))]
    pub radius_meters: f64,
    pub mode: GeofenceMode,
    #[serde(default)]
    pub push_notification: bool,
    pub active: Option<bool>,
}

impl CreateGeofenceRequest {
    pub fn into_geofence(self) -> Geofence {
        let mut geofence = Geofence::new(
            self.name.trim(),
            Coordinates::new(self.center_lat, self.center_lng),
            self.radius_meters,
            self.mode,
        )
        .with_push_notification(self.push_notification);
        geofence.active = self.active.unwrap_or(true);
        geofence
    }
}

// Interruptores de una geocerca existente
#[derive(Debug, Deserialize)]
pub struct UpdateGeofenceRequest {
    pub active: Option<bool>,
    pub push_notification: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ViolationQuery {
    pub limit: Option<usize>,
    pub geofence_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ViolationListResponse {
    pub capacity: usize,
    pub violations: Vec<ViolationEvent>,
}

#[derive(Debug, Serialize)]
pub struct GeofenceDeletedResponse {
    pub id: Uuid,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_must_be_positive() {
        let request: CreateGeofenceRequest = serde_json::from_value(serde_json::json!({
            "name": "Depot",
            "center_lat": 13.7,
            "center_lng": 100.5,
            "radius_meters": 0.0,
            "mode": "both"
        }))
        .unwrap();
        assert!(request.validate().unwrap_err().field_errors().contains_key("radius_meters"));
    }

    #[test]
    fn test_into_geofence_defaults_active() {
        let request: CreateGeofenceRequest = serde_json::from_value(serde_json::json!({
            "name": "  Depot ",
            "center_lat": 13.7,
            "center_lng": 100.5,
            "radius_meters": 500.0,
            "mode": "entry",
            "push_notification": true
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        let geofence = request.into_geofence();
        assert!(geofence.active);
        assert!(geofence.push_notification);
        assert_eq!(geofence.name, "Depot");
    }
}

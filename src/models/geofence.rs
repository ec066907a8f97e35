//! Modelos de Geofence y violaciones
//!
//! Una geocerca es un círculo (centro + radio en metros) con una política
//! de notificación por dirección de cruce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vehicle::Coordinates;

/// Direcciones de cruce que vigila una geocerca
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceMode {
    Entry,
    Exit,
    Both,
}

impl GeofenceMode {
    /// ¿Esta política vigila la dirección detectada?
    pub fn permits(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (GeofenceMode::Both, _)
                | (GeofenceMode::Entry, Direction::Entry)
                | (GeofenceMode::Exit, Direction::Exit)
        )
    }
}

/// Dirección de un cruce de frontera
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Entry,
    Exit,
}

impl Direction {
    /// Transición entre dos estados de contención; `None` si no hubo cruce
    pub fn from_transition(was_inside: bool, is_inside: bool) -> Option<Self> {
        match (was_inside, is_inside) {
            (false, true) => Some(Direction::Entry),
            (true, false) => Some(Direction::Exit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Entry => "entry",
            Direction::Exit => "exit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: Uuid,
    pub name: String,
    pub center: Coordinates,
    pub radius_meters: f64,
    pub mode: GeofenceMode,
    pub active: bool,
    pub push_notification: bool,
    pub violation_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Geofence {
    pub fn new(name: impl Into<String>, center: Coordinates, radius_meters: f64, mode: GeofenceMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            center,
            radius_meters,
            mode,
            active: true,
            push_notification: false,
            violation_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_push_notification(mut self, enabled: bool) -> Self {
        self.push_notification = enabled;
        self
    }
}

/// Registro inmutable de un cruce detectado
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViolationEvent {
    pub id: Uuid,
    pub geofence_id: Uuid,
    pub geofence_name: String,
    pub vehicle_id: Uuid,
    pub license_plate: String,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
    pub coordinates: Coordinates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(Direction::from_transition(false, true), Some(Direction::Entry));
        assert_eq!(Direction::from_transition(true, false), Some(Direction::Exit));
        assert_eq!(Direction::from_transition(true, true), None);
        assert_eq!(Direction::from_transition(false, false), None);
    }

    #[test]
    fn test_mode_permits() {
        assert!(GeofenceMode::Entry.permits(Direction::Entry));
        assert!(!GeofenceMode::Entry.permits(Direction::Exit));
        assert!(GeofenceMode::Exit.permits(Direction::Exit));
        assert!(!GeofenceMode::Exit.permits(Direction::Entry));
        assert!(GeofenceMode::Both.permits(Direction::Entry));
        assert!(GeofenceMode::Both.permits(Direction::Exit));
    }
}

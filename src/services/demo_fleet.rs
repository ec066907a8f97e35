//! Flota de demostración alrededor de Bangkok
//!
//! Solo se usa en desarrollo para que los bucles tengan datos.

use crate::models::geofence::{Geofence, GeofenceMode};
use crate::models::vehicle::{Coordinates, Vehicle, VehicleStatus};

pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 13.7244,
    lng: 100.5332,
};

/// (matrícula, conductor, estado, desplazamiento lat/lng, combustible, batería)
const DEMO_VEHICLES: [(&str, &str, VehicleStatus, Option<(f64, f64)>, f64, f64); 6] = [
    ("1กข-1234", "Somchai P.", VehicleStatus::Active, Some((0.0030, 0.0020)), 78.0, 92.0),
    ("2ขค-5678", "Anong S.", VehicleStatus::Active, Some((-0.0045, 0.0060)), 54.0, 81.0),
    ("3คง-9012", "Krit W.", VehicleStatus::Active, Some((0.0110, -0.0080)), 33.0, 67.0),
    ("4งจ-3456", "Malee T.", VehicleStatus::Idle, Some((-0.0150, -0.0030)), 91.0, 88.0),
    ("5จฉ-7890", "Niran K.", VehicleStatus::Maintenance, Some((0.0200, 0.0150)), 12.0, 40.0),
    ("6ฉช-2468", "Pim R.", VehicleStatus::Offline, None, 65.0, 15.0),
];

pub fn demo_vehicles() -> Vec<Vehicle> {
    DEMO_VEHICLES
        .iter()
        .map(|(plate, driver, status, offset, fuel, battery)| {
            let mut vehicle = Vehicle::new(*plate, *status);
            vehicle.driver_name = Some(driver.to_string());
            vehicle.fuel_level = Some(*fuel);
            vehicle.battery_level = Some(*battery);
            vehicle.engine_temperature = Some(if status == &VehicleStatus::Active { 88.0 } else { 30.0 });
            if let Some((dlat, dlng)) = offset {
                vehicle.set_coordinates(Some(DEFAULT_CENTER.offset(*dlat, *dlng)));
            }
            vehicle
        })
        .collect()
}

pub fn demo_geofences() -> Vec<Geofence> {
    vec![
        Geofence::new("Central Depot", DEFAULT_CENTER, 500.0, GeofenceMode::Both).with_push_notification(true),
        Geofence::new(
            "Restricted Zone",
            DEFAULT_CENTER.offset(0.0110, -0.0080),
            300.0,
            GeofenceMode::Entry,
        )
        .with_push_notification(true),
        Geofence::new(
            "Customer Site",
            DEFAULT_CENTER.offset(-0.0045, 0.0060),
            250.0,
            GeofenceMode::Exit,
        ),
    ]
}

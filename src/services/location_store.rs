//! Store de posiciones de la flota
//!
//! Lista en memoria de vehículos con sus coordenadas. Es el único dueño de
//! los registros `Vehicle`; el bucle de refresco y las ediciones del usuario
//! mutan a través de él.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::models::vehicle::{Vehicle, VehicleStatus};

#[derive(Clone, Default)]
pub struct LocationStore {
    vehicles: Arc<RwLock<Vec<Vehicle>>>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(vehicles: Vec<Vehicle>) -> Self {
        Self {
            vehicles: Arc::new(RwLock::new(vehicles)),
        }
    }

    /// Guard de lectura para recorridos consistentes
    pub async fn read(&self) -> RwLockReadGuard<'_, Vec<Vehicle>> {
        self.vehicles.read().await
    }

    /// Guard de escritura; quien lo tome debe soltarlo antes de volver a leer el store
    pub async fn write(&self) -> RwLockWriteGuard<'_, Vec<Vehicle>> {
        self.vehicles.write().await
    }

    pub async fn list(&self) -> Vec<Vehicle> {
        self.vehicles.read().await.clone()
    }

    pub async fn list_by_status(&self, status: Option<VehicleStatus>) -> Vec<Vehicle> {
        self.vehicles
            .read()
            .await
            .iter()
            .filter(|v| status.map_or(true, |s| v.status == s))
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<Vehicle> {
        self.vehicles.read().await.iter().find(|v| v.id == id).cloned()
    }

    /// Vehículos con coordenadas válidas
    pub async fn mappable(&self) -> Vec<Vehicle> {
        self.vehicles
            .read()
            .await
            .iter()
            .filter(|v| v.is_mappable())
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.vehicles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.vehicles.read().await.is_empty()
    }

}

/// ¿Otra entrada ya usa esta matrícula? La comparación ignora mayúsculas
pub fn plate_taken(vehicles: &[Vehicle], license_plate: &str, except: Option<Uuid>) -> bool {
    let wanted = license_plate.trim();
    vehicles
        .iter()
        .filter(|v| Some(v.id) != except)
        .any(|v| v.license_plate.trim().eq_ignore_ascii_case(wanted))
}

/// Aplica una mutación a un vehículo y sella `last_update`
pub fn mutate_vehicle<F>(vehicles: &mut [Vehicle], id: Uuid, f: F) -> Option<&Vehicle>
where
    F: FnOnce(&mut Vehicle),
{
    let vehicle = vehicles.iter_mut().find(|v| v.id == id)?;
    f(vehicle);
    vehicle.last_update = Utc::now();
    Some(vehicle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::Coordinates;

    fn sample_fleet() -> Vec<Vehicle> {
        vec![
            Vehicle::new("AB-1001", VehicleStatus::Active)
                .with_coordinates(Coordinates::new(13.72, 100.53)),
            Vehicle::new("AB-1002", VehicleStatus::Idle),
            Vehicle::new("AB-1003", VehicleStatus::Maintenance)
                .with_coordinates(Coordinates::new(13.75, 100.50)),
        ]
    }

    #[tokio::test]
    async fn test_mappable_excludes_missing_coordinates() {
        let store = LocationStore::with_vehicles(sample_fleet());
        assert_eq!(store.len().await, 3);
        assert_eq!(store.mappable().await.len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = LocationStore::with_vehicles(sample_fleet());
        assert_eq!(store.list_by_status(None).await.len(), 3);
        let idle = store.list_by_status(Some(VehicleStatus::Idle)).await;
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].license_plate, "AB-1002");
    }

    #[test]
    fn test_plate_lookup_is_case_insensitive() {
        let fleet = sample_fleet();
        let first_id = fleet[0].id;
        assert!(plate_taken(&fleet, "ab-1001", None));
        assert!(!plate_taken(&fleet, "ab-1001", Some(first_id)));
        assert!(!plate_taken(&fleet, "ZZ-0000", None));
    }

    #[tokio::test]
    async fn test_mutate_vehicle_stamps_last_update() {
        let store = LocationStore::with_vehicles(sample_fleet());
        let id = store.list().await[1].id;
        let before = store.get(id).await.unwrap().last_update;

        {
            let mut vehicles = store.write().await;
            let updated = mutate_vehicle(&mut vehicles, id, |v| v.fuel_level = Some(55.0));
            assert!(updated.is_some());
        }

        let after = store.get(id).await.unwrap();
        assert_eq!(after.fuel_level, Some(55.0));
        assert!(after.last_update >= before);

        let mut vehicles = store.write().await;
        assert!(mutate_vehicle(&mut vehicles, Uuid::new_v4(), |_| {}).is_none());
    }
}

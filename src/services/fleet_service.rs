//! Servicio de flota
//!
//! Ediciones de vehículos sobre el `LocationStore`. Cada edición se aplica
//! bajo el guard de escritura del store y se reconcilia con el mapa antes
//! de soltarlo, igual que hace el bucle de refresco.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::dto::vehicle_dto::UpdateVehicleRequest;
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::services::geofence_evaluator::GeofenceEvaluator;
use crate::services::geofence_store::{GeofenceStore, ViolationLog};
use crate::services::location_store::{mutate_vehicle, plate_taken, LocationStore};
use crate::services::marker_reconciler::{MarkerReconciler, RebuildReport, SkipReason, SyncOutcome};
use crate::services::metrics::TrackingMetrics;
use crate::utils::errors::{bad_request_error, conflict_error, not_found_error, AppResult};

#[derive(Debug, Serialize)]
pub struct FleetSummary {
    pub total_vehicles: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub mappable_vehicles: usize,
    pub average_fuel_level: Option<f64>,
    pub average_battery_level: Option<f64>,
    pub markers: usize,
    pub geofences_total: usize,
    pub geofences_active: usize,
    pub violations_logged: usize,
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub struct FleetService {
    store: LocationStore,
    reconciler: Arc<MarkerReconciler>,
    evaluator: Arc<GeofenceEvaluator>,
    geofences: Arc<GeofenceStore>,
    violations: Arc<ViolationLog>,
    metrics: TrackingMetrics,
}

impl FleetService {
    pub fn new(
        store: LocationStore,
        reconciler: Arc<MarkerReconciler>,
        evaluator: Arc<GeofenceEvaluator>,
        geofences: Arc<GeofenceStore>,
        violations: Arc<ViolationLog>,
        metrics: TrackingMetrics,
    ) -> Self {
        Self {
            store,
            reconciler,
            evaluator,
            geofences,
            violations,
            metrics,
        }
    }

    pub fn store(&self) -> &LocationStore {
        &self.store
    }

    async fn update_marker_gauge(&self) {
        self.metrics.markers.set(self.reconciler.marker_count().await as i64);
    }

    pub async fn list(&self, status: Option<VehicleStatus>) -> Vec<Vehicle> {
        self.store.list_by_status(status).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Vehicle> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    pub async fn create(&self, vehicle: Vehicle) -> AppResult<(Vehicle, SyncOutcome)> {
        let outcome = {
            let mut vehicles = self.store.write().await;
            if plate_taken(&vehicles, &vehicle.license_plate, None) {
                return Err(conflict_error("Vehicle", "license_plate", &vehicle.license_plate));
            }
            vehicles.push(vehicle.clone());
            self.reconciler.sync(&vehicle).await
        };

        log::info!("🚚 Vehículo {} creado", vehicle.license_plate);
        self.update_marker_gauge().await;
        Ok((vehicle, outcome))
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<(Vehicle, SyncOutcome)> {
        let (vehicle, outcome) = {
            let mut vehicles = self.store.write().await;

            if let Some(plate) = &request.license_plate {
                if plate_taken(&vehicles, plate, Some(id)) {
                    return Err(conflict_error("Vehicle", "license_plate", plate));
                }
            }

            let recreate = request.changes_marker_content();
            let vehicle = mutate_vehicle(&mut vehicles, id, |v| request.apply(v))
                .cloned()
                .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

            // Estado y popup cambian: el marcador se recrea
            let outcome = if recreate {
                self.reconciler.replace(&vehicle).await
            } else {
                self.reconciler.sync(&vehicle).await
            };
            (vehicle, outcome)
        };

        self.update_marker_gauge().await;
        Ok((vehicle, outcome))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<(Vehicle, SyncOutcome)> {
        let (vehicle, outcome) = {
            let mut vehicles = self.store.write().await;
            let index = vehicles
                .iter()
                .position(|v| v.id == id)
                .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;
            let vehicle = vehicles.remove(index);
            let outcome = self.reconciler.remove(id).await;
            (vehicle, outcome)
        };

        self.evaluator.forget_vehicle(id).await;
        self.update_marker_gauge().await;
        log::info!("🗑️ Vehículo {} eliminado", vehicle.license_plate);
        Ok((vehicle, outcome))
    }

    /// Sustituye la lista completa y reconstruye todos los marcadores
    pub async fn replace_fleet(
        &self,
        fleet: Vec<Vehicle>,
        focus: Option<Uuid>,
    ) -> AppResult<Result<RebuildReport, SkipReason>> {
        let mut ids = HashSet::new();
        for vehicle in &fleet {
            if !ids.insert(vehicle.id) {
                return Err(bad_request_error(&format!("Duplicate vehicle id {}", vehicle.id)));
            }
        }
        for (index, vehicle) in fleet.iter().enumerate() {
            if plate_taken(&fleet[..index], &vehicle.license_plate, None) {
                return Err(conflict_error("Vehicle", "license_plate", &vehicle.license_plate));
            }
        }

        let rebuilt = {
            let mut vehicles = self.store.write().await;
            *vehicles = fleet;
            self.reconciler.rebuild(&vehicles, focus).await
        };

        match &rebuilt {
            Ok(report) => log::info!(
                "🔄 Flota sustituida: {} marcadores creados, {} sin coordenadas",
                report.created,
                report.not_mappable.len()
            ),
            Err(reason) => log::warn!("⚠️ Flota sustituida sin reconstruir marcadores: {:?}", reason),
        }

        self.update_marker_gauge().await;
        Ok(rebuilt)
    }

    pub async fn summary(&self) -> FleetSummary {
        let vehicles = self.store.list().await;
        let geofences = self.geofences.list().await;

        let mut by_status = BTreeMap::new();
        for status in [
            VehicleStatus::Active,
            VehicleStatus::Idle,
            VehicleStatus::Maintenance,
            VehicleStatus::Offline,
        ] {
            by_status.insert(status.as_str(), vehicles.iter().filter(|v| v.status == status).count());
        }

        FleetSummary {
            total_vehicles: vehicles.len(),
            by_status,
            mappable_vehicles: vehicles.iter().filter(|v| v.is_mappable()).count(),
            average_fuel_level: average(vehicles.iter().filter_map(|v| v.fuel_level)),
            average_battery_level: average(vehicles.iter().filter_map(|v| v.battery_level)),
            markers: self.reconciler.marker_count().await,
            geofences_total: geofences.len(),
            geofences_active: geofences.iter().filter(|g| g.active).count(),
            violations_logged: self.violations.len().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::models::vehicle::Coordinates;
    use crate::services::map_surface::MarkerLayer;
    use crate::services::notification_service::LogNotifier;
    use crate::utils::errors::AppError;

    fn service() -> (FleetService, Arc<MarkerLayer>) {
        let store = LocationStore::new();
        let layer = Arc::new(MarkerLayer::new());
        let reconciler = Arc::new(MarkerReconciler::with_surface(layer.clone(), Duration::from_millis(1)));
        let geofences = Arc::new(GeofenceStore::new());
        let violations = Arc::new(ViolationLog::new(10));
        let metrics = TrackingMetrics::new().unwrap();
        let evaluator = Arc::new(GeofenceEvaluator::new(
            geofences.clone(),
            store.clone(),
            violations.clone(),
            Arc::new(LogNotifier),
            metrics.clone(),
        ));
        let service = FleetService::new(store, reconciler, evaluator, geofences, violations, metrics);
        (service, layer)
    }

    fn mapped(plate: &str) -> Vehicle {
        Vehicle::new(plate, VehicleStatus::Active).with_coordinates(Coordinates::new(13.7, 100.5))
    }

    #[tokio::test]
    async fn test_create_syncs_marker_and_rejects_duplicate_plate() {
        let (service, layer) = service();
        let (_, outcome) = service.create(mapped("AB-1")).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Created);
        assert_eq!(layer.len().await, 1);

        let duplicate = service.create(mapped("ab-1")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_clearing_coordinates_removes_marker() {
        let (service, layer) = service();
        let (vehicle, _) = service.create(mapped("AB-1")).await.unwrap();

        let request = UpdateVehicleRequest {
            clear_coordinates: true,
            ..UpdateVehicleRequest::default()
        };
        let (_, outcome) = service.update(vehicle.id, request).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Removed);
        assert!(layer.is_empty().await);
    }

    #[tokio::test]
    async fn test_status_change_recreates_marker() {
        let (service, layer) = service();
        let (vehicle, _) = service.create(mapped("AB-1")).await.unwrap();

        let request = UpdateVehicleRequest {
            status: Some(VehicleStatus::Maintenance),
            ..UpdateVehicleRequest::default()
        };
        let (_, outcome) = service.update(vehicle.id, request).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Recreated);
        let marker = layer.marker(vehicle.id).await.unwrap();
        assert_eq!(marker.color, VehicleStatus::Maintenance.marker_color());
    }

    #[tokio::test]
    async fn test_delete_removes_marker() {
        let (service, layer) = service();
        let (vehicle, _) = service.create(mapped("AB-1")).await.unwrap();

        let (_, outcome) = service.delete(vehicle.id).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Removed);
        assert!(layer.is_empty().await);
        assert!(matches!(service.delete(vehicle.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_fleet_rebuilds() {
        let (service, layer) = service();
        service.create(mapped("AB-1")).await.unwrap();

        let fleet = vec![mapped("CD-1"), mapped("CD-2"), Vehicle::new("CD-3", VehicleStatus::Offline)];
        let report = service.replace_fleet(fleet, None).await.unwrap().unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.created, 2);
        assert_eq!(report.not_mappable.len(), 1);
        assert_eq!(layer.len().await, 2);
        assert_eq!(service.store().len().await, 3);
    }

    #[tokio::test]
    async fn test_replace_fleet_rejects_duplicate_ids() {
        let (service, _) = service();
        let vehicle = mapped("AB-1");
        let mut copy = mapped("AB-2");
        copy.id = vehicle.id;
        let result = service.replace_fleet(vec![vehicle, copy], None).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let (service, _) = service();
        let mut a = mapped("AB-1");
        a.fuel_level = Some(40.0);
        let mut b = Vehicle::new("AB-2", VehicleStatus::Idle);
        b.fuel_level = Some(60.0);
        service.create(a).await.unwrap();
        service.create(b).await.unwrap();

        let summary = service.summary().await;
        assert_eq!(summary.total_vehicles, 2);
        assert_eq!(summary.by_status["active"], 1);
        assert_eq!(summary.by_status["idle"], 1);
        assert_eq!(summary.mappable_vehicles, 1);
        assert_eq!(summary.average_fuel_level, Some(50.0));
        assert_eq!(summary.average_battery_level, None);
        assert_eq!(summary.markers, 1);
    }
}

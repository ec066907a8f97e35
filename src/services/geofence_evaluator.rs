//! Evaluador de geocercas
//!
//! En cada tick compara la contención actual de cada par (vehículo,
//! geocerca) con la última conocida y emite una violación solo cuando hay
//! un cruce que la política de la geocerca vigila. La primera observación
//! de un par fija la línea base sin emitir nada.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::geofence::{Direction, Geofence, ViolationEvent};
use crate::models::vehicle::{Coordinates, Vehicle};
use crate::services::geofence_store::{GeofenceStore, ViolationLog};
use crate::services::location_store::LocationStore;
use crate::services::metrics::TrackingMetrics;
use crate::services::notification_service::{Notification, Notifier};
use crate::utils::geo::circle_containment;

type PairKey = (Uuid, Uuid);

/// Cruce detectado antes de aplicar la política de la geocerca
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub geofence_id: Uuid,
    pub vehicle_id: Uuid,
    pub license_plate: String,
    pub direction: Direction,
    pub coordinates: Coordinates,
    pub distance_meters: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct EvaluationReport {
    pub geofences_evaluated: usize,
    pub pairs_evaluated: usize,
    /// Vehículos sin coordenadas excluidos en este tick
    pub vehicles_skipped: Vec<Uuid>,
    /// Cruces que la política de la geocerca no vigila
    pub crossings_ignored: usize,
    pub violations: Vec<ViolationEvent>,
    pub notifications_sent: usize,
    pub notification_failures: usize,
}

/// Última contención conocida por par (vehículo, geocerca)
#[derive(Debug, Default)]
pub struct ContainmentTracker {
    last_known: HashMap<PairKey, bool>,
}

impl ContainmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, vehicle_id: Uuid, geofence_id: Uuid) -> Option<bool> {
        self.last_known.get(&(vehicle_id, geofence_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.last_known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_known.is_empty()
    }

    /// Guarda la contención actual y devuelve el cruce, si lo hubo
    pub fn observe(&mut self, vehicle_id: Uuid, geofence_id: Uuid, inside: bool) -> Option<Direction> {
        let previous = self.last_known.insert((vehicle_id, geofence_id), inside)?;
        Direction::from_transition(previous, inside)
    }

    pub fn forget_geofence(&mut self, geofence_id: Uuid) {
        self.last_known.retain(|(_, g), _| *g != geofence_id);
    }

    pub fn forget_vehicle(&mut self, vehicle_id: Uuid) {
        self.last_known.retain(|(v, _), _| *v != vehicle_id);
    }

    /// Conserva solo pares cuyo vehículo sigue en la flota y cuya geocerca sigue activa
    pub fn prune(&mut self, vehicle_ids: &[Uuid], active_geofence_ids: &[Uuid]) {
        self.last_known
            .retain(|(v, g), _| vehicle_ids.contains(v) && active_geofence_ids.contains(g));
    }
}

/// Paso puro de detección: actualiza el tracker y devuelve los cruces
pub fn detect_crossings(
    vehicles: &[Vehicle],
    geofences: &[Geofence],
    tracker: &mut ContainmentTracker,
    report: &mut EvaluationReport,
) -> Vec<Crossing> {
    let mut crossings = Vec::new();

    for vehicle in vehicles {
        let position = match vehicle.coordinates() {
            Some(position) => position,
            None => {
                report.vehicles_skipped.push(vehicle.id);
                continue;
            }
        };

        for geofence in geofences.iter().filter(|g| g.active) {
            report.pairs_evaluated += 1;
            let (distance, inside) = circle_containment(position, geofence.center, geofence.radius_meters);

            if let Some(direction) = tracker.observe(vehicle.id, geofence.id, inside) {
                crossings.push(Crossing {
                    geofence_id: geofence.id,
                    vehicle_id: vehicle.id,
                    license_plate: vehicle.license_plate.clone(),
                    direction,
                    coordinates: position,
                    distance_meters: distance,
                });
            }
        }
    }

    crossings
}

pub struct GeofenceEvaluator {
    geofences: Arc<GeofenceStore>,
    store: LocationStore,
    violations: Arc<ViolationLog>,
    notifier: Arc<dyn Notifier>,
    metrics: TrackingMetrics,
    tracker: Mutex<ContainmentTracker>,
}

impl GeofenceEvaluator {
    pub fn new(
        geofences: Arc<GeofenceStore>,
        store: LocationStore,
        violations: Arc<ViolationLog>,
        notifier: Arc<dyn Notifier>,
        metrics: TrackingMetrics,
    ) -> Self {
        Self {
            geofences,
            store,
            violations,
            notifier,
            metrics,
            tracker: Mutex::new(ContainmentTracker::new()),
        }
    }

    /// Un tick del evaluador
    pub async fn evaluate(&self) -> EvaluationReport {
        self.metrics.geofence_evaluations.inc();

        let vehicles = self.store.list().await;
        let active = self.geofences.active().await;

        let mut report = EvaluationReport {
            geofences_evaluated: active.len(),
            ..EvaluationReport::default()
        };

        let crossings = {
            let mut tracker = self.tracker.lock().await;
            let vehicle_ids: Vec<Uuid> = vehicles.iter().map(|v| v.id).collect();
            let geofence_ids: Vec<Uuid> = active.iter().map(|g| g.id).collect();
            tracker.prune(&vehicle_ids, &geofence_ids);
            detect_crossings(&vehicles, &active, &mut tracker, &mut report)
        };

        for crossing in crossings {
            let mode = active
                .iter()
                .find(|g| g.id == crossing.geofence_id)
                .map(|g| g.mode);
            if !mode.map_or(false, |m| m.permits(crossing.direction)) {
                report.crossings_ignored += 1;
                continue;
            }

            // La geocerca pudo borrarse o desactivarse durante el tick
            let geofence = match self.geofences.record_violation(crossing.geofence_id).await {
                Some(geofence) => geofence,
                None => {
                    report.crossings_ignored += 1;
                    continue;
                }
            };

            let event = ViolationEvent {
                id: Uuid::new_v4(),
                geofence_id: geofence.id,
                geofence_name: geofence.name.clone(),
                vehicle_id: crossing.vehicle_id,
                license_plate: crossing.license_plate.clone(),
                direction: crossing.direction,
                timestamp: Utc::now(),
                coordinates: crossing.coordinates,
            };

            log::info!(
                "🚧 {} {} geocerca '{}' ({:.0} m del centro)",
                event.license_plate,
                event.direction.as_str(),
                geofence.name,
                crossing.distance_meters
            );

            self.violations.prepend(event.clone()).await;
            self.metrics.geofence_violations.inc();

            if geofence.push_notification {
                let notification = Notification::for_violation(&geofence, &event);
                match self.notifier.notify(&notification).await {
                    Ok(()) => report.notifications_sent += 1,
                    Err(e) => {
                        log::warn!("⚠️ No se pudo notificar la violación: {}", e);
                        self.metrics.notification_failures.inc();
                        report.notification_failures += 1;
                    }
                }
            }

            report.violations.push(event);
        }

        report
    }

    /// Olvida el estado de contención de una geocerca borrada
    pub async fn forget_geofence(&self, geofence_id: Uuid) {
        self.tracker.lock().await.forget_geofence(geofence_id);
    }

    pub async fn forget_vehicle(&self, vehicle_id: Uuid) {
        self.tracker.lock().await.forget_vehicle(vehicle_id);
    }

    pub async fn last_known(&self, vehicle_id: Uuid, geofence_id: Uuid) -> Option<bool> {
        self.tracker.lock().await.get(vehicle_id, geofence_id)
    }

    pub async fn tracked_pairs(&self) -> usize {
        self.tracker.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geofence::GeofenceMode;
    use crate::models::vehicle::VehicleStatus;

    fn vehicle_at(lat: f64, lng: f64) -> Vehicle {
        Vehicle::new("AB-1", VehicleStatus::Active).with_coordinates(Coordinates::new(lat, lng))
    }

    #[test]
    fn test_first_observation_is_baseline() {
        let mut tracker = ContainmentTracker::new();
        let (v, g) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(tracker.observe(v, g, true), None);
        assert_eq!(tracker.observe(v, g, true), None);
        assert_eq!(tracker.observe(v, g, false), Some(Direction::Exit));
        assert_eq!(tracker.observe(v, g, true), Some(Direction::Entry));
    }

    #[test]
    fn test_detect_crossings_entry() {
        let geofence = Geofence::new("Depot", Coordinates::new(0.0, 0.0), 1_000.0, GeofenceMode::Entry);
        let mut tracker = ContainmentTracker::new();
        let mut report = EvaluationReport::default();

        let mut vehicle = vehicle_at(0.0, 0.1);
        let first = detect_crossings(&[vehicle.clone()], &[geofence.clone()], &mut tracker, &mut report);
        assert!(first.is_empty());

        vehicle.set_coordinates(Some(Coordinates::new(0.0, 0.001)));
        let second = detect_crossings(&[vehicle], &[geofence], &mut tracker, &mut report);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].direction, Direction::Entry);
        assert_eq!(report.pairs_evaluated, 2);
    }

    #[test]
    fn test_missing_coordinates_keep_last_known_state() {
        let geofence = Geofence::new("Depot", Coordinates::new(0.0, 0.0), 1_000.0, GeofenceMode::Both);
        let mut tracker = ContainmentTracker::new();
        let mut report = EvaluationReport::default();

        let mut vehicle = vehicle_at(0.0, 0.0);
        detect_crossings(&[vehicle.clone()], &[geofence.clone()], &mut tracker, &mut report);

        vehicle.set_coordinates(None);
        let none = detect_crossings(&[vehicle.clone()], &[geofence.clone()], &mut tracker, &mut report);
        assert!(none.is_empty());
        assert_eq!(report.vehicles_skipped, vec![vehicle.id]);
        assert_eq!(tracker.get(vehicle.id, geofence.id), Some(true));

        vehicle.set_coordinates(Some(Coordinates::new(0.0, 0.5)));
        let exit = detect_crossings(&[vehicle], &[geofence], &mut tracker, &mut report);
        assert_eq!(exit[0].direction, Direction::Exit);
    }

    #[test]
    fn test_prune_drops_inactive_and_removed() {
        let mut tracker = ContainmentTracker::new();
        let (v1, v2, g1, g2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        tracker.observe(v1, g1, true);
        tracker.observe(v1, g2, true);
        tracker.observe(v2, g1, false);

        tracker.prune(&[v1], &[g1]);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get(v1, g1), Some(true));
    }
}

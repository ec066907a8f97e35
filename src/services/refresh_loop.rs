//! Bucle de refresco de posiciones
//!
//! Cada tick desplaza ligeramente la posición de los vehículos activos,
//! reconcilia sus marcadores y envía una muestra de telemetría al destino
//! de posiciones. Sin mapa adjunto el tick se omite y se informa.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::models::vehicle::{LocationUpdate, Vehicle};
use crate::services::location_sink::LocationSink;
use crate::services::location_store::LocationStore;
use crate::services::marker_reconciler::{MarkerReconciler, SkipReason};
use crate::services::metrics::TrackingMetrics;

const MAX_SIMULATED_SPEED_KMH: f64 = 80.0;

#[derive(Debug, Default, Serialize)]
pub struct TickReport {
    pub moved: usize,
    pub markers_created: usize,
    pub markers_moved: usize,
    pub stale_markers_removed: usize,
    pub sink_failures: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "report")]
pub enum TickOutcome {
    Completed(TickReport),
    Skipped(SkipReason),
}

impl TickOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TickOutcome::Skipped(_))
    }
}

/// Desplaza cada vehículo activo con coordenadas dentro de `±bound` grados
/// por eje y devuelve la muestra que se enviará al destino.
pub fn jitter_fleet<R: Rng + ?Sized>(vehicles: &mut [Vehicle], bound: f64, rng: &mut R) -> Vec<LocationUpdate> {
    let bound = bound.abs();
    let now = Utc::now();
    let mut updates = Vec::new();

    for vehicle in vehicles.iter_mut().filter(|v| v.is_active()) {
        let position = match vehicle.coordinates() {
            Some(position) => position,
            None => continue,
        };

        let moved = position.offset(rng.gen_range(-bound..=bound), rng.gen_range(-bound..=bound));
        let speed = rng.gen_range(0.0..MAX_SIMULATED_SPEED_KMH);
        let heading = rng.gen_range(0.0..360.0);

        vehicle.set_coordinates(Some(moved));
        vehicle.speed = Some(speed);
        vehicle.heading = Some(heading);
        vehicle.last_update = now;

        updates.push(LocationUpdate {
            vehicle_id: vehicle.id,
            coordinates: moved,
            timestamp: now,
            speed,
            heading,
        });
    }

    updates
}

pub struct PositionRefresher {
    store: LocationStore,
    reconciler: Arc<MarkerReconciler>,
    sink: Arc<dyn LocationSink>,
    jitter_degrees: f64,
    metrics: TrackingMetrics,
}

impl PositionRefresher {
    pub fn new(
        store: LocationStore,
        reconciler: Arc<MarkerReconciler>,
        sink: Arc<dyn LocationSink>,
        jitter_degrees: f64,
        metrics: TrackingMetrics,
    ) -> Self {
        Self {
            store,
            reconciler,
            sink,
            jitter_degrees,
            metrics,
        }
    }

    /// Un tick del refresco. El desplazamiento se calcula sobre una copia
    /// y solo se escribe en el store si el mapa sigue adjunto cuando se
    /// sincronizan los marcadores.
    pub async fn tick(&self) -> TickOutcome {
        let mut report = TickReport::default();

        // Orden de locks: store primero, después el reconciliador
        let updates = {
            let mut vehicles = self.store.write().await;
            let mut moved = vehicles.clone();
            let updates = {
                let mut rng = rand::thread_rng();
                jitter_fleet(&mut moved, self.jitter_degrees, &mut rng)
            };

            let moved_ids: Vec<Uuid> = updates.iter().map(|u| u.vehicle_id).collect();
            match self.reconciler.sync_fleet(&moved, &moved_ids).await {
                Ok(sync) => {
                    report.stale_markers_removed = sync.stale_removed;
                    report.markers_created = sync.created;
                    report.markers_moved = sync.moved;
                }
                Err(reason) => {
                    self.metrics.refresh_ticks_skipped.inc();
                    log::debug!("⏭️ Tick de refresco omitido: no hay mapa adjunto");
                    return TickOutcome::Skipped(reason);
                }
            }

            *vehicles = moved;
            updates
        };

        self.metrics.refresh_ticks.inc();
        report.moved = updates.len();
        self.metrics.position_updates.inc_by(updates.len() as u64);
        self.metrics.markers.set(self.reconciler.marker_count().await as i64);

        let results = join_all(updates.iter().map(|update| self.sink.push(update))).await;
        for (update, result) in updates.iter().zip(results) {
            if let Err(e) = result {
                log::warn!(
                    "⚠️ Destino '{}' rechazó la posición de {}: {}",
                    self.sink.name(),
                    update.vehicle_id,
                    e
                );
                self.metrics.sink_failures.inc();
                report.sink_failures += 1;
            }
        }

        TickOutcome::Completed(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::{Coordinates, VehicleStatus};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_jitter_moves_only_active_mappable_vehicles() {
        let active = Vehicle::new("AB-1", VehicleStatus::Active).with_coordinates(Coordinates::new(13.7, 100.5));
        let idle = Vehicle::new("AB-2", VehicleStatus::Idle).with_coordinates(Coordinates::new(13.8, 100.6));
        let unmapped = Vehicle::new("AB-3", VehicleStatus::Active);
        let mut fleet = vec![active.clone(), idle.clone(), unmapped];

        let mut rng = StdRng::seed_from_u64(7);
        let updates = jitter_fleet(&mut fleet, 0.00025, &mut rng);

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].vehicle_id, active.id);
        assert_eq!(fleet[1].coordinates(), idle.coordinates());
        assert!(fleet[2].coordinates().is_none());

        let before = active.coordinates().unwrap();
        let after = fleet[0].coordinates().unwrap();
        assert!((after.lat - before.lat).abs() <= 0.00025);
        assert!((after.lng - before.lng).abs() <= 0.00025);
        assert!((0.0..80.0).contains(&updates[0].speed));
        assert!((0.0..360.0).contains(&updates[0].heading));
    }

    #[test]
    fn test_zero_jitter_keeps_position() {
        let vehicle = Vehicle::new("AB-1", VehicleStatus::Active).with_coordinates(Coordinates::new(13.7, 100.5));
        let mut fleet = vec![vehicle.clone()];
        let mut rng = StdRng::seed_from_u64(1);
        jitter_fleet(&mut fleet, 0.0, &mut rng);
        assert_eq!(fleet[0].coordinates(), vehicle.coordinates());
    }
}

//! Servicio de geocercas
//!
//! Coordina el store de geocercas con el estado de contención del evaluador
//! para que una geocerca borrada o desactivada no deje rastro.

use std::sync::Arc;

use uuid::Uuid;

use crate::dto::geofence_dto::UpdateGeofenceRequest;
use crate::models::geofence::{Geofence, ViolationEvent};
use crate::services::geofence_evaluator::GeofenceEvaluator;
use crate::services::geofence_store::{GeofenceStore, ViolationLog};
use crate::utils::errors::{not_found_error, AppResult};

pub struct GeofenceService {
    geofences: Arc<GeofenceStore>,
    violations: Arc<ViolationLog>,
    evaluator: Arc<GeofenceEvaluator>,
}

impl GeofenceService {
    pub fn new(geofences: Arc<GeofenceStore>, violations: Arc<ViolationLog>, evaluator: Arc<GeofenceEvaluator>) -> Self {
        Self {
            geofences,
            violations,
            evaluator,
        }
    }

    pub async fn create(&self, geofence: Geofence) -> Geofence {
        log::info!(
            "📍 Geocerca '{}' creada ({:.0} m, modo {:?})",
            geofence.name,
            geofence.radius_meters,
            geofence.mode
        );
        self.geofences.insert(geofence).await
    }

    pub async fn list(&self) -> Vec<Geofence> {
        self.geofences.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Geofence> {
        self.geofences
            .get(id)
            .await
            .ok_or_else(|| not_found_error("Geofence", &id.to_string()))
    }

    pub async fn update(&self, id: Uuid, request: UpdateGeofenceRequest) -> AppResult<Geofence> {
        let mut geofence = self.get(id).await?;

        if let Some(push) = request.push_notification {
            geofence = self
                .geofences
                .set_push_notification(id, push)
                .await
                .ok_or_else(|| not_found_error("Geofence", &id.to_string()))?;
        }

        if let Some(active) = request.active {
            geofence = self
                .geofences
                .set_active(id, active)
                .await
                .ok_or_else(|| not_found_error("Geofence", &id.to_string()))?;
            // Al reactivarla se vuelve a fijar la línea base
            if !active {
                self.evaluator.forget_geofence(id).await;
            }
        }

        Ok(geofence)
    }

    /// Borra la geocerca y su estado de contención
    pub async fn delete(&self, id: Uuid) -> AppResult<Geofence> {
        let geofence = self
            .geofences
            .remove(id)
            .await
            .ok_or_else(|| not_found_error("Geofence", &id.to_string()))?;
        self.evaluator.forget_geofence(id).await;
        log::info!("🗑️ Geocerca '{}' eliminada", geofence.name);
        Ok(geofence)
    }

    pub async fn violations(&self, geofence_id: Option<Uuid>, limit: Option<usize>) -> Vec<ViolationEvent> {
        match geofence_id {
            Some(id) => {
                let mut events = self.violations.for_geofence(id).await;
                if let Some(limit) = limit {
                    events.truncate(limit);
                }
                events
            }
            None => self.violations.recent(limit).await,
        }
    }

    pub fn violation_capacity(&self) -> usize {
        self.violations.capacity()
    }

    pub async fn clear_violations(&self) -> usize {
        self.violations.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geofence::GeofenceMode;
    use crate::models::vehicle::{Coordinates, Vehicle, VehicleStatus};
    use crate::services::location_store::LocationStore;
    use crate::services::metrics::TrackingMetrics;
    use crate::services::notification_service::LogNotifier;
    use crate::utils::errors::AppError;

    #[tokio::test]
    async fn test_delete_purges_containment() {
        let store = LocationStore::with_vehicles(vec![
            Vehicle::new("AB-1", VehicleStatus::Active).with_coordinates(Coordinates::new(0.0, 0.0)),
        ]);
        let geofences = Arc::new(GeofenceStore::new());
        let violations = Arc::new(ViolationLog::new(10));
        let evaluator = Arc::new(GeofenceEvaluator::new(
            geofences.clone(),
            store,
            violations.clone(),
            Arc::new(LogNotifier),
            TrackingMetrics::new().unwrap(),
        ));
        let service = GeofenceService::new(geofences, violations, evaluator.clone());

        let geofence = service
            .create(Geofence::new("Depot", Coordinates::new(0.0, 0.0), 100.0, GeofenceMode::Both))
            .await;
        evaluator.evaluate().await;
        assert_eq!(evaluator.tracked_pairs().await, 1);

        service.delete(geofence.id).await.unwrap();
        assert_eq!(evaluator.tracked_pairs().await, 0);
        assert!(matches!(service.get(geofence.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete(geofence.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_flags() {
        let geofences = Arc::new(GeofenceStore::new());
        let violations = Arc::new(ViolationLog::new(10));
        let evaluator = Arc::new(GeofenceEvaluator::new(
            geofences.clone(),
            LocationStore::new(),
            violations.clone(),
            Arc::new(LogNotifier),
            TrackingMetrics::new().unwrap(),
        ));
        let service = GeofenceService::new(geofences, violations, evaluator);

        let geofence = service
            .create(Geofence::new("Depot", Coordinates::new(0.0, 0.0), 100.0, GeofenceMode::Entry))
            .await;
        let updated = service
            .update(
                geofence.id,
                UpdateGeofenceRequest {
                    active: Some(false),
                    push_notification: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(!updated.active);
        assert!(updated.push_notification);
    }
}

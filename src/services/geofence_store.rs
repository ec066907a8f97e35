//! Store de geocercas y registro de violaciones

use std::collections::VecDeque;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::environment::MAX_VIOLATION_LOG_CAPACITY;
use crate::models::geofence::{Geofence, ViolationEvent};

#[derive(Default)]
pub struct GeofenceStore {
    geofences: RwLock<Vec<Geofence>>,
}

impl GeofenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, geofence: Geofence) -> Geofence {
        self.geofences.write().await.push(geofence.clone());
        geofence
    }

    pub async fn list(&self) -> Vec<Geofence> {
        self.geofences.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Geofence> {
        self.geofences.read().await.iter().find(|g| g.id == id).cloned()
    }

    /// Geocercas que el evaluador debe revisar
    pub async fn active(&self) -> Vec<Geofence> {
        self.geofences
            .read()
            .await
            .iter()
            .filter(|g| g.active)
            .cloned()
            .collect()
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Option<Geofence> {
        let mut geofences = self.geofences.write().await;
        let geofence = geofences.iter_mut().find(|g| g.id == id)?;
        geofence.active = active;
        Some(geofence.clone())
    }

    pub async fn set_push_notification(&self, id: Uuid, enabled: bool) -> Option<Geofence> {
        let mut geofences = self.geofences.write().await;
        let geofence = geofences.iter_mut().find(|g| g.id == id)?;
        geofence.push_notification = enabled;
        Some(geofence.clone())
    }

    pub async fn remove(&self, id: Uuid) -> Option<Geofence> {
        let mut geofences = self.geofences.write().await;
        let index = geofences.iter().position(|g| g.id == id)?;
        Some(geofences.remove(index))
    }

    /// Incrementa el contador de una geocerca activa.
    /// `None` si fue borrada o desactivada desde que empezó el tick.
    pub async fn record_violation(&self, id: Uuid) -> Option<Geofence> {
        let mut geofences = self.geofences.write().await;
        let geofence = geofences.iter_mut().find(|g| g.id == id && g.active)?;
        geofence.violation_count += 1;
        Some(geofence.clone())
    }

    pub async fn len(&self) -> usize {
        self.geofences.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.geofences.read().await.is_empty()
    }
}

/// Lista rodante de violaciones, la más reciente primero
pub struct ViolationLog {
    events: RwLock<VecDeque<ViolationEvent>>,
    capacity: usize,
}

impl ViolationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity.min(MAX_VIOLATION_LOG_CAPACITY))),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn prepend(&self, event: ViolationEvent) {
        let mut events = self.events.write().await;
        events.push_front(event);
        events.truncate(self.capacity);
    }

    pub async fn recent(&self, limit: Option<usize>) -> Vec<ViolationEvent> {
        let events = self.events.read().await;
        events
            .iter()
            .take(limit.unwrap_or(self.capacity))
            .cloned()
            .collect()
    }

    pub async fn for_geofence(&self, geofence_id: Uuid) -> Vec<ViolationEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.geofence_id == geofence_id)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) -> usize {
        let mut events = self.events.write().await;
        let cleared = events.len();
        events.clear();
        cleared
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

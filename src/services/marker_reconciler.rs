//! Reconciliador de marcadores
//!
//! Mantiene exactamente un marcador por vehículo con coordenadas válidas
//! sobre la superficie del mapa. Cada operación devuelve un resultado
//! explícito en lugar de ignorar en silencio las precondiciones que faltan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::marker::Marker;
use crate::models::vehicle::{Coordinates, Vehicle};
use crate::services::map_surface::MapSurface;

/// Motivo por el que una operación no tocó el mapa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MapUnavailable,
    NotMappable,
    VehicleNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum SyncOutcome {
    Created,
    Moved,
    Recreated,
    Removed,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum FocusOutcome {
    Focused,
    Skipped(SkipReason),
}

/// Resultado de reconstruir todos los marcadores
#[derive(Debug)]
pub struct RebuildReport {
    pub removed: usize,
    pub created: usize,
    pub not_mappable: Vec<Uuid>,
    pub focus: Option<FocusOutcome>,
    /// Reapertura diferida del popup del vehículo enfocado
    pub popup_task: Option<JoinHandle<bool>>,
}

/// Efecto de un tick de refresco sobre los marcadores
#[derive(Debug, Default)]
pub struct FleetSync {
    pub stale_removed: usize,
    pub created: usize,
    pub moved: usize,
}

#[derive(Default)]
struct ReconcilerState {
    surface: Option<Arc<dyn MapSurface>>,
    markers: HashMap<Uuid, Coordinates>,
}

pub struct MarkerReconciler {
    state: Mutex<ReconcilerState>,
    popup_reopen_delay: Duration,
}

impl MarkerReconciler {
    /// Reconciliador sin mapa adjunto
    pub fn new(popup_reopen_delay: Duration) -> Self {
        Self {
            state: Mutex::new(ReconcilerState::default()),
            popup_reopen_delay,
        }
    }

    pub fn with_surface(surface: Arc<dyn MapSurface>, popup_reopen_delay: Duration) -> Self {
        Self {
            state: Mutex::new(ReconcilerState {
                surface: Some(surface),
                markers: HashMap::new(),
            }),
            popup_reopen_delay,
        }
    }

    /// Adjunta una superficie nueva; los marcadores de la anterior se retiran
    pub async fn attach(&self, surface: Arc<dyn MapSurface>) -> usize {
        let mut state = self.state.lock().await;
        let removed = Self::clear_markers(&mut state).await;
        state.surface = Some(surface);
        log::info!("🗺️ Mapa adjuntado ({} marcadores anteriores retirados)", removed);
        removed
    }

    /// Desmonta el mapa: retira todos los marcadores y suelta la superficie
    pub async fn detach(&self) -> usize {
        let mut state = self.state.lock().await;
        let removed = Self::clear_markers(&mut state).await;
        state.surface = None;
        log::info!("🗺️ Mapa desmontado, {} marcadores retirados", removed);
        removed
    }

    pub async fn is_attached(&self) -> bool {
        self.state.lock().await.surface.is_some()
    }

    pub async fn marker_count(&self) -> usize {
        self.state.lock().await.markers.len()
    }

    pub async fn has_marker(&self, vehicle_id: Uuid) -> bool {
        self.state.lock().await.markers.contains_key(&vehicle_id)
    }

    /// Crea el marcador si no existe o lo mueve en su sitio.
    /// Mover no reconstruye el popup.
    pub async fn sync(&self, vehicle: &Vehicle) -> SyncOutcome {
        let mut state = self.state.lock().await;
        let surface = match state.surface.clone() {
            Some(surface) => surface,
            None => return SyncOutcome::Skipped(SkipReason::MapUnavailable),
        };
        Self::sync_on(&mut state, &surface, vehicle).await
    }

    /// Un paso completo del refresco bajo un único lock: retira los
    /// marcadores huérfanos y sincroniza los vehículos movidos. Sin mapa
    /// no se toca nada.
    pub async fn sync_fleet(&self, vehicles: &[Vehicle], moved: &[Uuid]) -> Result<FleetSync, SkipReason> {
        let mut state = self.state.lock().await;
        let surface = state.surface.clone().ok_or(SkipReason::MapUnavailable)?;

        let live: Vec<Uuid> = vehicles.iter().map(|v| v.id).collect();
        let mut report = FleetSync {
            stale_removed: Self::retain_on(&mut state, &surface, &live).await,
            ..FleetSync::default()
        };

        for vehicle in vehicles.iter().filter(|v| moved.contains(&v.id)) {
            match Self::sync_on(&mut state, &surface, vehicle).await {
                SyncOutcome::Created => report.created += 1,
                SyncOutcome::Moved => report.moved += 1,
                _ => {}
            }
        }
        Ok(report)
    }

    async fn sync_on(state: &mut ReconcilerState, surface: &Arc<dyn MapSurface>, vehicle: &Vehicle) -> SyncOutcome {
        let position = match vehicle.coordinates() {
            Some(position) => position,
            None => {
                if state.markers.remove(&vehicle.id).is_some() {
                    surface.remove_marker(vehicle.id).await;
                    return SyncOutcome::Removed;
                }
                return SyncOutcome::Skipped(SkipReason::NotMappable);
            }
        };

        if state.markers.contains_key(&vehicle.id) && surface.move_marker(vehicle.id, position).await {
            state.markers.insert(vehicle.id, position);
            return SyncOutcome::Moved;
        }

        // Sin handle, o la superficie lo perdió: se crea de nuevo
        surface.add_marker(Marker::for_vehicle(vehicle, position)).await;
        state.markers.insert(vehicle.id, position);
        SyncOutcome::Created
    }

    /// Recrea el marcador para refrescar icono y popup tras una edición
    pub async fn replace(&self, vehicle: &Vehicle) -> SyncOutcome {
        let mut state = self.state.lock().await;
        let surface = match state.surface.clone() {
            Some(surface) => surface,
            None => return SyncOutcome::Skipped(SkipReason::MapUnavailable),
        };

        let existed = state.markers.remove(&vehicle.id).is_some();
        if existed {
            surface.remove_marker(vehicle.id).await;
        }

        match vehicle.coordinates() {
            Some(position) => {
                surface.add_marker(Marker::for_vehicle(vehicle, position)).await;
                state.markers.insert(vehicle.id, position);
                if existed {
                    SyncOutcome::Recreated
                } else {
                    SyncOutcome::Created
                }
            }
            None if existed => SyncOutcome::Removed,
            None => SyncOutcome::Skipped(SkipReason::NotMappable),
        }
    }

    pub async fn remove(&self, vehicle_id: Uuid) -> SyncOutcome {
        let mut state = self.state.lock().await;
        let surface = match state.surface.clone() {
            Some(surface) => surface,
            None => return SyncOutcome::Skipped(SkipReason::MapUnavailable),
        };

        if state.markers.remove(&vehicle_id).is_some() {
            surface.remove_marker(vehicle_id).await;
            SyncOutcome::Removed
        } else {
            SyncOutcome::Skipped(SkipReason::VehicleNotFound)
        }
    }

    /// Retira los marcadores cuyo vehículo ya no está en `live`
    async fn retain_on(state: &mut ReconcilerState, surface: &Arc<dyn MapSurface>, live: &[Uuid]) -> usize {
        let stale: Vec<Uuid> = state
            .markers
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();

        for id in &stale {
            state.markers.remove(id);
            surface.remove_marker(*id).await;
        }
        stale.len()
    }

    /// Reconstruye todos los marcadores desde cero para una lista completa
    /// de vehículos y, si se pide, enfoca uno y reabre su popup tras el retardo.
    pub async fn rebuild(&self, vehicles: &[Vehicle], focus: Option<Uuid>) -> Result<RebuildReport, SkipReason> {
        let mut state = self.state.lock().await;
        let surface = state.surface.clone().ok_or(SkipReason::MapUnavailable)?;

        let removed = Self::clear_markers(&mut state).await;

        let mut created = 0;
        let mut not_mappable = Vec::new();
        for vehicle in vehicles {
            match vehicle.coordinates() {
                Some(position) => {
                    if state.markers.insert(vehicle.id, position).is_some() {
                        log::warn!("⚠️ Vehículo duplicado en la lista: {}", vehicle.id);
                    } else {
                        created += 1;
                    }
                    surface.add_marker(Marker::for_vehicle(vehicle, position)).await;
                }
                None => not_mappable.push(vehicle.id),
            }
        }

        let mut popup_task = None;
        let focus = match focus {
            None => None,
            Some(vehicle_id) => {
                let (outcome, task) = self
                    .focus_on(&surface, vehicles.iter().find(|v| v.id == vehicle_id))
                    .await;
                popup_task = task;
                Some(outcome)
            }
        };

        log::debug!(
            "🔄 Marcadores reconstruidos: {} retirados, {} creados, {} sin coordenadas",
            removed,
            created,
            not_mappable.len()
        );

        Ok(RebuildReport {
            removed,
            created,
            not_mappable,
            focus,
            popup_task,
        })
    }

    /// Enfoca el mapa en un vehículo y reabre su popup tras el retardo
    pub async fn focus(&self, vehicle: Option<&Vehicle>) -> (FocusOutcome, Option<JoinHandle<bool>>) {
        let state = self.state.lock().await;
        match state.surface.clone() {
            Some(surface) => self.focus_on(&surface, vehicle).await,
            None => (FocusOutcome::Skipped(SkipReason::MapUnavailable), None),
        }
    }

    async fn focus_on(
        &self,
        surface: &Arc<dyn MapSurface>,
        vehicle: Option<&Vehicle>,
    ) -> (FocusOutcome, Option<JoinHandle<bool>>) {
        let vehicle = match vehicle {
            Some(vehicle) => vehicle,
            None => return (FocusOutcome::Skipped(SkipReason::VehicleNotFound), None),
        };
        match vehicle.coordinates() {
            None => (FocusOutcome::Skipped(SkipReason::NotMappable), None),
            Some(center) => {
                surface.focus(vehicle.id, center).await;
                let task = self.schedule_popup(surface.clone(), vehicle.id);
                (FocusOutcome::Focused, Some(task))
            }
        }
    }

    fn schedule_popup(&self, surface: Arc<dyn MapSurface>, vehicle_id: Uuid) -> JoinHandle<bool> {
        let delay = self.popup_reopen_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            surface.open_popup(vehicle_id).await
        })
    }

    async fn clear_markers(state: &mut ReconcilerState) -> usize {
        let ids: Vec<Uuid> = state.markers.drain().map(|(id, _)| id).collect();
        if let Some(surface) = &state.surface {
            for id in &ids {
                surface.remove_marker(*id).await;
            }
        }
        ids.len()
    }
}

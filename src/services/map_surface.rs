//! Superficie del mapa
//!
//! `MapSurface` es el handle de renderizado que consume el reconciliador:
//! crear, mover y quitar marcadores, abrir popups y enfocar la vista.
//! `MarkerLayer` es la implementación en memoria que la API expone como
//! GeoJSON para el front-end de Mapbox.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::marker::Marker;
use crate::models::vehicle::Coordinates;

#[async_trait]
pub trait MapSurface: Send + Sync {
    /// Adjunta un marcador; reemplaza uno anterior con el mismo id
    async fn add_marker(&self, marker: Marker);

    /// Mueve un marcador existente; `false` si no existe
    async fn move_marker(&self, vehicle_id: Uuid, position: Coordinates) -> bool;

    async fn remove_marker(&self, vehicle_id: Uuid) -> bool;

    async fn open_popup(&self, vehicle_id: Uuid) -> bool;

    async fn focus(&self, vehicle_id: Uuid, center: Coordinates);
}

/// Vista actual del mapa
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapFocus {
    pub vehicle_id: Uuid,
    pub center: Coordinates,
}

#[derive(Default)]
struct LayerState {
    markers: HashMap<Uuid, Marker>,
    focus: Option<MapFocus>,
}

/// Capa de marcadores en memoria
#[derive(Default)]
pub struct MarkerLayer {
    state: RwLock<LayerState>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn markers(&self) -> Vec<Marker> {
        let state = self.state.read().await;
        let mut markers: Vec<Marker> = state.markers.values().cloned().collect();
        markers.sort_by(|a, b| a.popup.title.cmp(&b.popup.title));
        markers
    }

    pub async fn marker(&self, vehicle_id: Uuid) -> Option<Marker> {
        self.state.read().await.markers.get(&vehicle_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.markers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.markers.is_empty()
    }

    pub async fn current_focus(&self) -> Option<MapFocus> {
        self.state.read().await.focus
    }

    /// FeatureCollection GeoJSON con un Feature por marcador
    pub async fn feature_collection(&self) -> serde_json::Value {
        let features: Vec<serde_json::Value> =
            self.markers().await.iter().map(Marker::to_feature).collect();

        serde_json::json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}

#[async_trait]
impl MapSurface for MarkerLayer {
    async fn add_marker(&self, marker: Marker) {
        let mut state = self.state.write().await;
        state.markers.insert(marker.vehicle_id, marker);
    }

    async fn move_marker(&self, vehicle_id: Uuid, position: Coordinates) -> bool {
        let mut state = self.state.write().await;
        match state.markers.get_mut(&vehicle_id) {
            Some(marker) => {
                marker.position = position;
                true
            }
            None => false,
        }
    }

    async fn remove_marker(&self, vehicle_id: Uuid) -> bool {
        let mut state = self.state.write().await;
        if state.focus.map_or(false, |f| f.vehicle_id == vehicle_id) {
            state.focus = None;
        }
        state.markers.remove(&vehicle_id).is_some()
    }

    async fn open_popup(&self, vehicle_id: Uuid) -> bool {
        let mut state = self.state.write().await;
        let exists = state.markers.contains_key(&vehicle_id);
        if exists {
            for (id, marker) in state.markers.iter_mut() {
                marker.popup_open = *id == vehicle_id;
            }
        }
        exists
    }

    async fn focus(&self, vehicle_id: Uuid, center: Coordinates) {
        self.state.write().await.focus = Some(MapFocus { vehicle_id, center });
    }
}

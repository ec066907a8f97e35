use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::vehicle::Coordinates;
use crate::services::map_surface::MapFocus;
use crate::services::marker_reconciler::FocusOutcome;
use crate::services::tracking_runtime::{LoopKind, TrackingStatus};

// Configuración para el front-end de Mapbox
#[derive(Debug, Serialize)]
pub struct MapConfigResponse {
    pub mapbox_token: Option<String>,
    pub default_center: Coordinates,
    pub default_zoom: f64,
    pub popup_reopen_delay_ms: u64,
    pub refresh_interval_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct MapStateResponse {
    pub attached: bool,
    pub markers: usize,
    pub focus: Option<MapFocus>,
    pub open_popup: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub vehicle_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct FocusResponse {
    pub vehicle_id: Uuid,
    pub focus: FocusOutcome,
}

// Montar/desmontar el mapa
#[derive(Debug, Serialize)]
pub struct SurfaceResponse {
    pub attached: bool,
    pub markers_removed: usize,
    pub markers_created: usize,
}

// Acción sobre un bucle de seguimiento
#[derive(Debug, Serialize)]
pub struct LoopActionResponse {
    pub loop_kind: LoopKind,
    pub changed: bool,
    pub status: TrackingStatus,
}

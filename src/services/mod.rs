//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación:
//! los stores en memoria, el reconciliador de marcadores, los dos bucles
//! de seguimiento y la autenticación simulada.

pub mod auth_service;
pub mod demo_fleet;
pub mod fleet_service;
pub mod geofence_evaluator;
pub mod geofence_service;
pub mod geofence_store;
pub mod jwt_service;
pub mod location_sink;
pub mod location_store;
pub mod map_surface;
pub mod marker_reconciler;
pub mod metrics;
pub mod notification_service;
pub mod refresh_loop;
pub mod tracking_runtime;

pub use geofence_evaluator::{EvaluationReport, GeofenceEvaluator};
pub use location_store::LocationStore;
pub use marker_reconciler::{MarkerReconciler, SkipReason, SyncOutcome};
pub use refresh_loop::{PositionRefresher, TickOutcome};
pub use tracking_runtime::{LoopHandle, LoopKind, TrackingRuntime};

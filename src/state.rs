//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todos los stores son valores explícitos:
//! cada test construye su propia instancia aislada.

use std::sync::Arc;

use anyhow::Result;

use crate::config::environment::EnvironmentConfig;
use crate::middleware::rate_limit::RateLimitState;
use crate::services::auth_service::AuthService;
use crate::services::demo_fleet::{demo_geofences, demo_vehicles};
use crate::services::fleet_service::FleetService;
use crate::services::geofence_evaluator::GeofenceEvaluator;
use crate::services::geofence_service::GeofenceService;
use crate::services::geofence_store::{GeofenceStore, ViolationLog};
use crate::services::jwt_service::JwtService;
use crate::services::location_sink::{HttpLocationSink, LocationSink, LoggingLocationSink};
use crate::services::location_store::LocationStore;
use crate::services::map_surface::MarkerLayer;
use crate::services::marker_reconciler::MarkerReconciler;
use crate::services::metrics::TrackingMetrics;
use crate::services::notification_service::{LogNotifier, Notifier, WebhookNotifier};
use crate::services::refresh_loop::PositionRefresher;
use crate::services::tracking_runtime::TrackingRuntime;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: LocationStore,
    pub layer: Arc<MarkerLayer>,
    pub reconciler: Arc<MarkerReconciler>,
    pub fleet: Arc<FleetService>,
    pub geofences: Arc<GeofenceService>,
    pub tracking: Arc<TrackingRuntime>,
    pub auth: Arc<AuthService>,
    pub metrics: TrackingMetrics,
    pub rate_limit: RateLimitState,
}

impl AppState {
    /// Estado con los destinos que indica la configuración
    pub fn new(config: EnvironmentConfig) -> Result<Self> {
        let sink: Arc<dyn LocationSink> = match &config.location_sink_url {
            Some(url) => {
                log::info!("📡 Posiciones enviadas a {}", url);
                Arc::new(HttpLocationSink::new(url.as_str())?)
            }
            None => Arc::new(LoggingLocationSink),
        };
        let notifier: Arc<dyn Notifier> = match &config.notification_webhook_url {
            Some(url) => {
                log::info!("🔔 Notificaciones enviadas a {}", url);
                Arc::new(WebhookNotifier::new(url.as_str())?)
            }
            None => Arc::new(LogNotifier),
        };
        Self::with_outputs(config, sink, notifier)
    }

    /// Estado con destinos inyectados
    pub fn with_outputs(
        config: EnvironmentConfig,
        sink: Arc<dyn LocationSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;
        let metrics = TrackingMetrics::new()?;

        let store = LocationStore::new();
        let geofence_store = Arc::new(GeofenceStore::new());
        let violations = Arc::new(ViolationLog::new(config.violation_log_capacity));

        // El mapa arranca montado
        let layer = Arc::new(MarkerLayer::new());
        let reconciler = Arc::new(MarkerReconciler::with_surface(
            layer.clone(),
            config.popup_reopen_delay(),
        ));

        let evaluator = Arc::new(GeofenceEvaluator::new(
            geofence_store.clone(),
            store.clone(),
            violations.clone(),
            notifier,
            metrics.clone(),
        ));
        let refresher = Arc::new(PositionRefresher::new(
            store.clone(),
            reconciler.clone(),
            sink,
            config.jitter_degrees,
            metrics.clone(),
        ));

        let fleet = Arc::new(FleetService::new(
            store.clone(),
            reconciler.clone(),
            evaluator.clone(),
            geofence_store.clone(),
            violations.clone(),
            metrics.clone(),
        ));
        let geofences = Arc::new(GeofenceService::new(geofence_store, violations, evaluator.clone()));

        let tracking = Arc::new(TrackingRuntime::new(
            refresher,
            evaluator,
            config.refresh_interval(),
            config.geofence_interval(),
        ));

        let auth = Arc::new(AuthService::new(
            JwtService::from_environment(&config),
            config.bcrypt_cost,
        ));
        let rate_limit = RateLimitState::new(&config);

        Ok(Self {
            config,
            store,
            layer,
            reconciler,
            fleet,
            geofences,
            tracking,
            auth,
            metrics,
            rate_limit,
        })
    }

    /// Usuarios de demostración y, si está activado, la flota de ejemplo
    pub async fn seed_demo_data(&self) -> Result<()> {
        self.auth.seed_demo_users().await?;

        if self.config.seed_demo_fleet {
            let vehicles = demo_vehicles();
            let count = vehicles.len();
            self.fleet.replace_fleet(vehicles, None).await?.ok();
            for geofence in demo_geofences() {
                self.geofences.create(geofence).await;
            }
            log::info!("🚚 Flota de demostración cargada: {} vehículos", count);
        }
        Ok(())
    }
}

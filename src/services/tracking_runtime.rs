//! Ejecución de los bucles periódicos
//!
//! Cada bucle corre en su propia tarea tokio y se controla con un
//! `LoopHandle`: `shutdown()` lo detiene y espera a la tarea; soltar el
//! handle también lo detiene. Los ticks de un mismo bucle nunca se solapan.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::services::geofence_evaluator::{EvaluationReport, GeofenceEvaluator};
use crate::services::refresh_loop::{PositionRefresher, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    Refresh,
    Geofence,
}

impl LoopKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopKind::Refresh => "refresh",
            LoopKind::Geofence => "geofence",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "refresh" => Some(LoopKind::Refresh),
            "geofence" => Some(LoopKind::Geofence),
            _ => None,
        }
    }
}

/// Handle de cancelación de un bucle periódico
pub struct LoopHandle {
    kind: LoopKind,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl LoopHandle {
    pub fn kind(&self) -> LoopKind {
        self.kind
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Detiene el bucle y espera a que la tarea termine
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("⚠️ El bucle '{}' terminó con error: {}", self.kind.as_str(), e);
            }
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

/// Lanza `tick` cada `period`; el primer tick llega tras un periodo completo
pub fn spawn_periodic<F, Fut>(kind: LoopKind, period: Duration, mut tick: F) -> LoopHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                changed = stopped.changed() => {
                    if changed.is_err() || *stopped.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => tick().await,
            }
        }

        log::info!("🛑 Bucle '{}' detenido", kind.as_str());
    });

    log::info!("▶️ Bucle '{}' iniciado cada {:?}", kind.as_str(), period);

    LoopHandle {
        kind,
        stop,
        task: Some(task),
    }
}

pub fn spawn_refresh_loop(refresher: Arc<PositionRefresher>, period: Duration) -> LoopHandle {
    spawn_periodic(LoopKind::Refresh, period, move || {
        let refresher = refresher.clone();
        async move {
            if let TickOutcome::Completed(report) = refresher.tick().await {
                log::debug!("🔄 Refresco: {} posiciones actualizadas", report.moved);
            }
        }
    })
}

pub fn spawn_geofence_loop(evaluator: Arc<GeofenceEvaluator>, period: Duration) -> LoopHandle {
    spawn_periodic(LoopKind::Geofence, period, move || {
        let evaluator = evaluator.clone();
        async move {
            let report = evaluator.evaluate().await;
            if !report.violations.is_empty() {
                log::debug!("🚧 {} violaciones en este tick", report.violations.len());
            }
        }
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopStatus {
    pub running: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingStatus {
    pub refresh: LoopStatus,
    pub geofence: LoopStatus,
}

/// Dueño de los dos bucles de seguimiento
pub struct TrackingRuntime {
    refresher: Arc<PositionRefresher>,
    evaluator: Arc<GeofenceEvaluator>,
    refresh_interval: Duration,
    geofence_interval: Duration,
    refresh_handle: Mutex<Option<LoopHandle>>,
    geofence_handle: Mutex<Option<LoopHandle>>,
}

impl TrackingRuntime {
    pub fn new(
        refresher: Arc<PositionRefresher>,
        evaluator: Arc<GeofenceEvaluator>,
        refresh_interval: Duration,
        geofence_interval: Duration,
    ) -> Self {
        Self {
            refresher,
            evaluator,
            refresh_interval,
            geofence_interval,
            refresh_handle: Mutex::new(None),
            geofence_handle: Mutex::new(None),
        }
    }

    pub fn refresher(&self) -> &Arc<PositionRefresher> {
        &self.refresher
    }

    pub fn evaluator(&self) -> &Arc<GeofenceEvaluator> {
        &self.evaluator
    }

    fn slot(&self, kind: LoopKind) -> &Mutex<Option<LoopHandle>> {
        match kind {
            LoopKind::Refresh => &self.refresh_handle,
            LoopKind::Geofence => &self.geofence_handle,
        }
    }

    /// `false` si el bucle ya estaba en marcha
    pub async fn start(&self, kind: LoopKind) -> bool {
        let mut slot = self.slot(kind).lock().await;
        if slot.as_ref().map_or(false, |h| h.is_running()) {
            return false;
        }

        let handle = match kind {
            LoopKind::Refresh => spawn_refresh_loop(self.refresher.clone(), self.refresh_interval),
            LoopKind::Geofence => spawn_geofence_loop(self.evaluator.clone(), self.geofence_interval),
        };
        *slot = Some(handle);
        true
    }

    /// `false` si el bucle no estaba en marcha
    pub async fn stop(&self, kind: LoopKind) -> bool {
        let handle = self.slot(kind).lock().await.take();
        match handle {
            Some(handle) => {
                let was_running = handle.is_running();
                handle.shutdown().await;
                was_running
            }
            None => false,
        }
    }

    pub async fn start_all(&self) {
        self.start(LoopKind::Refresh).await;
        self.start(LoopKind::Geofence).await;
    }

    pub async fn stop_all(&self) {
        self.stop(LoopKind::Refresh).await;
        self.stop(LoopKind::Geofence).await;
    }

    pub async fn is_running(&self, kind: LoopKind) -> bool {
        self.slot(kind)
            .lock()
            .await
            .as_ref()
            .map_or(false, |h| h.is_running())
    }

    pub async fn status(&self) -> TrackingStatus {
        TrackingStatus {
            refresh: LoopStatus {
                running: self.is_running(LoopKind::Refresh).await,
                interval_ms: self.refresh_interval.as_millis() as u64,
            },
            geofence: LoopStatus {
                running: self.is_running(LoopKind::Geofence).await,
                interval_ms: self.geofence_interval.as_millis() as u64,
            },
        }
    }

    /// Un tick de refresco manual, fuera del temporizador
    pub async fn refresh_now(&self) -> TickOutcome {
        self.refresher.tick().await
    }

    pub async fn evaluate_now(&self) -> EvaluationReport {
        self.evaluator.evaluate().await
    }
}

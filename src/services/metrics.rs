//! Métricas de los bucles de seguimiento (formato Prometheus)

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct TrackingMetrics {
    registry: Registry,
    pub refresh_ticks: IntCounter,
    pub refresh_ticks_skipped: IntCounter,
    pub position_updates: IntCounter,
    pub sink_failures: IntCounter,
    pub geofence_evaluations: IntCounter,
    pub geofence_violations: IntCounter,
    pub notification_failures: IntCounter,
    pub markers: IntGauge,
}

impl TrackingMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("fleet".to_string()), None)?;

        let refresh_ticks = IntCounter::new("refresh_ticks_total", "Ticks del bucle de refresco")?;
        let refresh_ticks_skipped = IntCounter::new(
            "refresh_ticks_skipped_total",
            "Ticks de refresco omitidos por falta de mapa",
        )?;
        let position_updates = IntCounter::new(
            "position_updates_total",
            "Posiciones desplazadas por el bucle de refresco",
        )?;
        let sink_failures = IntCounter::new(
            "location_sink_failures_total",
            "Envíos fallidos al destino de posiciones",
        )?;
        let geofence_evaluations = IntCounter::new(
            "geofence_evaluations_total",
            "Ticks del evaluador de geocercas",
        )?;
        let geofence_violations = IntCounter::new(
            "geofence_violations_total",
            "Violaciones de geocercas emitidas",
        )?;
        let notification_failures = IntCounter::new(
            "notification_failures_total",
            "Notificaciones que no se pudieron entregar",
        )?;
        let markers = IntGauge::new("map_markers", "Marcadores presentes en el mapa")?;

        registry.register(Box::new(refresh_ticks.clone()))?;
        registry.register(Box::new(refresh_ticks_skipped.clone()))?;
        registry.register(Box::new(position_updates.clone()))?;
        registry.register(Box::new(sink_failures.clone()))?;
        registry.register(Box::new(geofence_evaluations.clone()))?;
        registry.register(Box::new(geofence_violations.clone()))?;
        registry.register(Box::new(notification_failures.clone()))?;
        registry.register(Box::new(markers.clone()))?;

        Ok(Self {
            registry,
            refresh_ticks,
            refresh_ticks_skipped,
            position_updates,
            sink_failures,
            geofence_evaluations,
            geofence_violations,
            notification_failures,
            markers,
        })
    }

    /// Exposición en formato texto de Prometheus
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_prefixed_counters() {
        let metrics = TrackingMetrics::new().unwrap();
        metrics.refresh_ticks.inc();
        metrics.markers.set(3);

        let text = metrics.render().unwrap();
        assert!(text.contains("fleet_refresh_ticks_total 1"));
        assert!(text.contains("fleet_map_markers 3"));
    }
}

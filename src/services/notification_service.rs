//! Notificaciones de violaciones de geocercas
//!
//! Una notificación es un par título/descripción, equivalente a un toast
//! del dashboard. Se emite solo si la geocerca tiene activado el push.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::geofence::{Direction, Geofence, ViolationEvent};
use crate::services::location_sink::SinkError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn for_violation(geofence: &Geofence, event: &ViolationEvent) -> Self {
        let (title, verb) = match event.direction {
            Direction::Entry => ("Geofence entry", "entered"),
            Direction::Exit => ("Geofence exit", "left"),
        };
        Self {
            title: title.to_string(),
            description: format!(
                "Vehicle {} {} {} at {}",
                event.license_plate,
                verb,
                geofence.name,
                event.timestamp.format("%H:%M:%S")
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Notificador por defecto: escribe el aviso en el log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        log::info!("🔔 {}: {}", notification.title, notification.description);
        Ok(())
    }
}

/// Publica la notificación en un webhook
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("❌ Webhook de notificaciones respondió {}", status);
            return Err(SinkError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geofence::GeofenceMode;
    use crate::models::vehicle::Coordinates;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_violation_notification_text() {
        let geofence = Geofence::new("Depot", Coordinates::new(13.7, 100.5), 500.0, GeofenceMode::Both);
        let event = ViolationEvent {
            id: Uuid::new_v4(),
            geofence_id: geofence.id,
            geofence_name: geofence.name.clone(),
            vehicle_id: Uuid::new_v4(),
            license_plate: "AB-1234".to_string(),
            direction: Direction::Exit,
            timestamp: Utc::now(),
            coordinates: Coordinates::new(13.71, 100.51),
        };

        let notification = Notification::for_violation(&geofence, &event);
        assert_eq!(notification.title, "Geofence exit");
        assert!(notification.description.starts_with("Vehicle AB-1234 left Depot"));
    }
}

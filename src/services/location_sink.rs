//! Destinos de actualizaciones de posición
//!
//! El bucle de refresco envía cada muestra `{vehicleId, coordinates,
//! timestamp, speed, heading}` a un `LocationSink`. Los fallos se devuelven
//! al llamador, que los registra y los cuenta; no hay reintentos.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::models::vehicle::LocationUpdate;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Destination rejected the payload with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait LocationSink: Send + Sync {
    async fn push(&self, update: &LocationUpdate) -> Result<(), SinkError>;

    fn name(&self) -> &'static str;
}

/// Destino por defecto: solo deja traza en el log
#[derive(Debug, Default)]
pub struct LoggingLocationSink;

#[async_trait]
impl LocationSink for LoggingLocationSink {
    async fn push(&self, update: &LocationUpdate) -> Result<(), SinkError> {
        log::debug!(
            "📍 {} -> ({:.6}, {:.6}) {:.1} km/h {:.0}°",
            update.vehicle_id,
            update.coordinates.lat,
            update.coordinates.lng,
            update.speed,
            update.heading
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Envía cada muestra como JSON a un endpoint externo
pub struct HttpLocationSink {
    client: Client,
    url: String,
}

impl HttpLocationSink {
    pub fn new(url: impl Into<String>) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl LocationSink for HttpLocationSink {
    async fn push(&self, update: &LocationUpdate) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .header("User-Agent", "FleetTracking/1.0")
            .json(update)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status.as_u16()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

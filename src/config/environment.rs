//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Todas las claves tienen un valor por defecto; solo un valor mal formado
//! produce un error.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_GEOFENCE_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_JITTER_DEGREES: f64 = 0.00025;
pub const DEFAULT_VIOLATION_LOG_CAPACITY: usize = 50;
pub const DEFAULT_POPUP_REOPEN_DELAY_MS: u64 = 300;
pub const MAX_JWT_EXPIRATION_SECS: u64 = 365 * 24 * 3600;
pub const MAX_VIOLATION_LOG_CAPACITY: usize = 10_000;

/// Errores al leer la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    NotPositive { key: &'static str },

    #[error("{key} must not exceed {max}")]
    TooLarge { key: &'static str, max: u64 },
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    pub mapbox_token: Option<String>,
    // Bucles de seguimiento
    pub refresh_interval_ms: u64,
    pub geofence_interval_ms: u64,
    pub jitter_degrees: f64,
    pub violation_log_capacity: usize,
    pub popup_reopen_delay_ms: u64,
    // Destinos externos
    pub location_sink_url: Option<String>,
    pub notification_webhook_url: Option<String>,
    pub seed_demo_fleet: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            jwt_secret: "fleet-tracking-dev-secret-change-in-production".to_string(),
            jwt_expiration: 86_400,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_origins: Vec::new(),
            rate_limit_requests: 20,
            rate_limit_window: 60,
            mapbox_token: None,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            geofence_interval_ms: DEFAULT_GEOFENCE_INTERVAL_MS,
            jitter_degrees: DEFAULT_JITTER_DEGREES,
            violation_log_capacity: DEFAULT_VIOLATION_LOG_CAPACITY,
            popup_reopen_delay_ms: DEFAULT_POPUP_REOPEN_DELAY_MS,
            location_sink_url: None,
            notification_webhook_url: None,
            seed_demo_fleet: true,
        }
    }
}

/// Lee una variable y la convierte, usando `default` si no está definida
fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl EnvironmentConfig {
    /// Construir la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let seed_default = environment == "development";

        let config = Self {
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_expiration: parse_var("JWT_EXPIRATION", defaults.jwt_expiration)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            cors_origins: optional_var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_requests: parse_var("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            rate_limit_window: parse_var("RATE_LIMIT_WINDOW", defaults.rate_limit_window)?,
            mapbox_token: optional_var("MAPBOX_TOKEN"),
            refresh_interval_ms: parse_var("REFRESH_INTERVAL_MS", defaults.refresh_interval_ms)?,
            geofence_interval_ms: parse_var("GEOFENCE_INTERVAL_MS", defaults.geofence_interval_ms)?,
            jitter_degrees: parse_var("JITTER_DEGREES", defaults.jitter_degrees)?,
            violation_log_capacity: parse_var(
                "VIOLATION_LOG_CAPACITY",
                defaults.violation_log_capacity,
            )?,
            popup_reopen_delay_ms: parse_var(
                "POPUP_REOPEN_DELAY_MS",
                defaults.popup_reopen_delay_ms,
            )?,
            location_sink_url: optional_var("LOCATION_SINK_URL"),
            notification_webhook_url: optional_var("NOTIFICATION_WEBHOOK_URL"),
            seed_demo_fleet: parse_var("SEED_DEMO_FLEET", seed_default)?,
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rechaza valores que los servicios no pueden usar
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_expiration == 0 {
            return Err(ConfigError::NotPositive { key: "JWT_EXPIRATION" });
        }
        if self.jwt_expiration > MAX_JWT_EXPIRATION_SECS {
            return Err(ConfigError::TooLarge {
                key: "JWT_EXPIRATION",
                max: MAX_JWT_EXPIRATION_SECS,
            });
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::NotPositive { key: "REFRESH_INTERVAL_MS" });
        }
        if self.geofence_interval_ms == 0 {
            return Err(ConfigError::NotPositive { key: "GEOFENCE_INTERVAL_MS" });
        }
        if self.violation_log_capacity == 0 {
            return Err(ConfigError::NotPositive { key: "VIOLATION_LOG_CAPACITY" });
        }
        if self.violation_log_capacity > MAX_VIOLATION_LOG_CAPACITY {
            return Err(ConfigError::TooLarge {
                key: "VIOLATION_LOG_CAPACITY",
                max: MAX_VIOLATION_LOG_CAPACITY as u64,
            });
        }
        if !(self.jitter_degrees.is_finite() && self.jitter_degrees >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "JITTER_DEGREES",
                value: self.jitter_degrees.to_string(),
            });
        }
        Ok(())
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn geofence_interval(&self) -> Duration {
        Duration::from_millis(self.geofence_interval_ms)
    }

    pub fn popup_reopen_delay(&self) -> Duration {
        Duration::from_millis(self.popup_reopen_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_timers() {
        let config = EnvironmentConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.geofence_interval(), Duration::from_secs(10));
        assert_eq!(config.jitter_degrees, 0.00025);
        assert_eq!(config.environment, "development");
        assert_eq!(config.server_url(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = EnvironmentConfig {
            refresh_interval_ms: 0,
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { key: "REFRESH_INTERVAL_MS" })
        ));
    }

    #[test]
    fn test_validate_bounds_token_lifetime() {
        let forever = EnvironmentConfig {
            jwt_expiration: u64::MAX,
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            forever.validate(),
            Err(ConfigError::TooLarge { key: "JWT_EXPIRATION", .. })
        ));

        let zero = EnvironmentConfig {
            jwt_expiration: 0,
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::NotPositive { key: "JWT_EXPIRATION" })
        ));
    }

    #[test]
    fn test_validate_bounds_violation_log() {
        let config = EnvironmentConfig {
            violation_log_capacity: usize::MAX,
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge { key: "VIOLATION_LOG_CAPACITY", .. })
        ));

        let largest = EnvironmentConfig {
            violation_log_capacity: MAX_VIOLATION_LOG_CAPACITY,
            ..EnvironmentConfig::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_jitter() {
        let config = EnvironmentConfig {
            jitter_degrees: -1.0,
            ..EnvironmentConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::config::environment::{EnvironmentConfig, MAX_JWT_EXPIRATION_SECS};
use crate::models::auth::{JwtClaims, UserInfo, UserRole};
use crate::utils::errors::{AppError, AppResult};

/// Configuración JWT
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
}

impl JwtConfig {
    pub fn from_environment(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::seconds(
                i64::try_from(config.jwt_expiration.min(MAX_JWT_EXPIRATION_SECS)).unwrap_or(i64::MAX),
            ),
        }
    }
}

/// Servicio JWT
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn from_environment(config: &EnvironmentConfig) -> Self {
        Self::new(JwtConfig::from_environment(config))
    }

    /// Segundos de validez de un token de acceso
    pub fn expires_in(&self) -> i64 {
        self.config.access_token_duration.num_seconds()
    }

    /// Genera un token de acceso ligado a una sesión
    pub fn generate_access_token(&self, user_info: &UserInfo, session_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + self.config.access_token_duration;

        let claims = JwtClaims {
            sub: user_info.id.to_string(),
            username: user_info.username.clone(),
            full_name: user_info.full_name.clone(),
            role: user_info.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: session_id.to_string(),
        };

        Ok(encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)?)
    }

    /// Valida y decodifica un token
    pub fn validate_token(&self, token: &str) -> AppResult<JwtClaims> {
        let validation = Validation::new(self.config.algorithm);
        Ok(decode::<JwtClaims>(token, &self.decoding_key, &validation)?.claims)
    }

    /// Usuario y sesión a los que pertenece el token
    pub fn get_user_info(&self, token: &str) -> AppResult<(UserInfo, Uuid)> {
        let claims = self.validate_token(token)?;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Jwt("Invalid subject in token".to_string()))?;
        let session_id = Uuid::parse_str(&claims.jti)
            .map_err(|_| AppError::Jwt("Invalid session in token".to_string()))?;
        let role = UserRole::from_str(&claims.role)
            .ok_or_else(|| AppError::Jwt("Invalid role in token".to_string()))?;

        let user = UserInfo {
            id,
            username: claims.username,
            full_name: claims.full_name,
            role,
        };
        Ok((user, session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(expiration: u64) -> JwtService {
        let config = EnvironmentConfig {
            jwt_expiration: expiration,
            ..EnvironmentConfig::default()
        };
        JwtService::from_environment(&config)
    }

    fn manager() -> UserInfo {
        UserInfo {
            id: Uuid::new_v4(),
            username: "manager".to_string(),
            full_name: "Fleet Manager".to_string(),
            role: UserRole::FleetManager,
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let jwt_service = service(3600);
        let user_info = manager();

        let session_id = Uuid::new_v4();
        let token = jwt_service.generate_access_token(&user_info, session_id).unwrap();
        assert!(!token.is_empty());

        let claims = jwt_service.validate_token(&token).unwrap();
        assert_eq!(claims.username, "manager");
        assert_eq!(claims.role, "fleet_manager");

        assert_eq!(jwt_service.get_user_info(&token).unwrap(), (user_info, session_id));
    }

    #[test]
    fn test_oversized_expiration_is_clamped() {
        let config = JwtConfig::from_environment(&EnvironmentConfig {
            jwt_expiration: u64::MAX,
            ..EnvironmentConfig::default()
        });
        assert_eq!(config.access_token_duration, Duration::days(365));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = service(3600).generate_access_token(&manager(), Uuid::new_v4()).unwrap();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::hours(1),
        });
        assert!(matches!(other.validate_token(&token), Err(AppError::Jwt(_))));
    }
}

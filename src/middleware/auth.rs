//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y verificación de roles de los usuarios autenticados.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    models::auth::{UserInfo, UserRole},
    state::AppState,
    utils::errors::{forbidden_error, AppError, AppResult},
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserInfo);

impl AuthenticatedUser {
    pub fn info(&self) -> &UserInfo {
        &self.0
    }

    /// Exige un rol mínimo: Admin ⊇ FleetManager ⊇ Driver
    pub fn require(&self, role: UserRole) -> AppResult<&UserInfo> {
        if self.0.role.includes(role) {
            Ok(&self.0)
        } else {
            Err(forbidden_error(
                "perform this operation",
                &format!("requires role {}", role.as_str()),
            ))
        }
    }
}

/// Token Bearer del header Authorization
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let user = state.auth.authenticate(token).await?;

    // Inyectar usuario autenticado en las extensions
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser(UserInfo {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            full_name: "Some One".to_string(),
            role,
        })
    }

    #[test]
    fn test_require_role() {
        assert!(user(UserRole::Admin).require(UserRole::FleetManager).is_ok());
        assert!(matches!(
            user(UserRole::Driver).require(UserRole::FleetManager),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}

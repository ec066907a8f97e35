use axum::{
    extract::{Json, Query, State},
    http::HeaderMap,
    Extension,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::auth_dto::{ActivityQuery, LoginRequest, LoginResponse, RegisterUserRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::rate_limit::client_ip;
use crate::models::auth::{LoginActivity, SessionInfo, UserInfo, UserRole};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Endpoint de login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    payload.validate()?;

    let response = state
        .auth
        .login(&payload.username, &payload.password, client_ip(&headers))
        .await?;

    Ok(Json(ApiResponse::success_with_message(response, "Login successful")))
}

/// Endpoint de logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
) -> Json<Value> {
    let success = state.auth.logout(user.info(), client_ip(&headers)).await;

    Json(json!({
        "success": success,
        "message": if success { "Logout successful" } else { "Session not found" }
    }))
}

/// Usuario del token actual
pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<ApiResponse<UserInfo>> {
    Json(ApiResponse::success(user.0))
}

/// Alta de usuario (solo admins)
pub async fn register_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, AppError> {
    user.require(UserRole::Admin)?;
    payload.validate()?;

    let created = state.auth.register(payload).await?;
    Ok(Json(ApiResponse::success_with_message(created, "User registered")))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<UserInfo>>>, AppError> {
    user.require(UserRole::Admin)?;
    Ok(Json(ApiResponse::success(state.auth.list_users().await)))
}

/// Endpoint para obtener sesiones activas (solo para admins)
pub async fn get_active_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<SessionInfo>>>, AppError> {
    user.require(UserRole::Admin)?;
    Ok(Json(ApiResponse::success(state.auth.active_sessions().await)))
}

/// Registro de intentos de login, el más reciente primero (solo para admins)
pub async fn login_activity(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<LoginActivity>>>, AppError> {
    user.require(UserRole::Admin)?;
    Ok(Json(ApiResponse::success(state.auth.recent_activity(query.limit).await)))
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Driver,
    FleetManager,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Driver => "driver",
            UserRole::FleetManager => "fleet_manager",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "driver" => Some(UserRole::Driver),
            "fleet_manager" => Some(UserRole::FleetManager),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Los roles están ordenados: Admin ⊇ FleetManager ⊇ Driver
    pub fn includes(&self, required: UserRole) -> bool {
        *self >= required
    }
}

/// Información del usuario autenticado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user_id
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
    pub jti: String, // session id
}

/// Información de la sesión activa
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Solo los tokens emitidos para esta sesión son válidos
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Entrada del registro de actividad de login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginActivity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: String,
    pub action: LoginAction,
    pub success: bool,
    pub client_ip: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginAction {
    Login,
    Logout,
}

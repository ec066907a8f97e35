//! Servicio de autenticación simulada
//!
//! Usuarios en memoria con contraseñas bcrypt, sesiones JWT y un registro
//! acotado de intentos de login (incluidos los fallidos).

use std::collections::{HashMap, VecDeque};

use bcrypt::{hash, verify};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::auth_dto::{LoginResponse, RegisterUserRequest};
use crate::models::auth::{LoginAction, LoginActivity, SessionInfo, UserInfo, UserRole};
use crate::services::jwt_service::JwtService;
use crate::utils::errors::{conflict_error, AppError, AppResult};

const ACTIVITY_LOG_CAPACITY: usize = 100;

/// Usuarios de demostración: (usuario, contraseña, nombre, rol)
const DEMO_USERS: [(&str, &str, &str, UserRole); 3] = [
    ("admin", "admin123", "Fleet Administrator", UserRole::Admin),
    ("manager", "manager123", "Fleet Manager", UserRole::FleetManager),
    ("driver", "driver123", "Demo Driver", UserRole::Driver),
];

#[derive(Debug, Clone)]
struct StoredUser {
    info: UserInfo,
    password_hash: String,
}

/// Servicio de autenticación
pub struct AuthService {
    jwt_service: JwtService,
    bcrypt_cost: u32,
    // Clave: username en minúsculas
    users: RwLock<HashMap<String, StoredUser>>,
    // Cache de sesiones activas
    sessions: RwLock<HashMap<Uuid, SessionInfo>>,
    activity: RwLock<VecDeque<LoginActivity>>,
}

impl AuthService {
    pub fn new(jwt_service: JwtService, bcrypt_cost: u32) -> Self {
        Self {
            jwt_service,
            bcrypt_cost,
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            activity: RwLock::new(VecDeque::with_capacity(ACTIVITY_LOG_CAPACITY)),
        }
    }

    /// Inicializa los usuarios de ejemplo
    pub async fn seed_demo_users(&self) -> AppResult<usize> {
        let mut created = 0;
        for (username, password, full_name, role) in DEMO_USERS {
            if self.find(username).await.is_some() {
                continue;
            }
            self.insert_user(username, password, full_name, role).await?;
            created += 1;
        }
        log::info!("👥 {} usuarios de demostración disponibles", created);
        Ok(created)
    }

    pub async fn register(&self, request: RegisterUserRequest) -> AppResult<UserInfo> {
        let username = request.username.trim();
        if self.find(username).await.is_some() {
            return Err(conflict_error("User", "username", username));
        }
        let user = self
            .insert_user(username, &request.password, request.full_name.trim(), request.role)
            .await?;
        log::info!("👤 Usuario '{}' registrado con rol {}", user.username, user.role.as_str());
        Ok(user)
    }

    async fn insert_user(&self, username: &str, password: &str, full_name: &str, role: UserRole) -> AppResult<UserInfo> {
        let info = UserInfo {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            role,
        };
        let stored = StoredUser {
            info: info.clone(),
            password_hash: hash(password, self.bcrypt_cost)?,
        };

        let mut users = self.users.write().await;
        let key = username.to_lowercase();
        if users.contains_key(&key) {
            return Err(conflict_error("User", "username", username));
        }
        users.insert(key, stored);
        Ok(info)
    }

    async fn find(&self, username: &str) -> Option<StoredUser> {
        self.users.read().await.get(&username.trim().to_lowercase()).cloned()
    }

    /// Autentica un usuario y abre su sesión
    pub async fn login(&self, username: &str, password: &str, client_ip: Option<String>) -> AppResult<LoginResponse> {
        let user = match self.find(username).await {
            Some(user) if verify(password, &user.password_hash)? => user,
            found => {
                self.record(LoginActivity {
                    id: Uuid::new_v4(),
                    user_id: found.map(|u| u.info.id),
                    username: username.to_string(),
                    action: LoginAction::Login,
                    success: false,
                    client_ip,
                    timestamp: Utc::now(),
                })
                .await;
                log::warn!("🔒 Login fallido para '{}'", username);
                return Err(AppError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        // Un login nuevo sustituye la sesión anterior y sus tokens
        let session_id = Uuid::new_v4();
        let token = self.jwt_service.generate_access_token(&user.info, session_id)?;

        let now = Utc::now();
        self.sessions.write().await.insert(
            user.info.id,
            SessionInfo {
                session_id,
                user_id: user.info.id,
                username: user.info.username.clone(),
                role: user.info.role,
                created_at: now,
                last_activity: now,
            },
        );

        self.record(LoginActivity {
            id: Uuid::new_v4(),
            user_id: Some(user.info.id),
            username: user.info.username.clone(),
            action: LoginAction::Login,
            success: true,
            client_ip,
            timestamp: now,
        })
        .await;

        log::info!("✅ Login de '{}' ({})", user.info.username, user.info.role.as_str());
        Ok(LoginResponse::bearer(token, self.jwt_service.expires_in(), user.info))
    }

    /// Valida un token y exige que su sesión siga abierta
    pub async fn authenticate(&self, token: &str) -> AppResult<UserInfo> {
        let (user, session_id) = self.jwt_service.get_user_info(token)?;

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&user.id) {
            Some(session) if session.session_id == session_id => {
                session.last_activity = Utc::now();
                Ok(user)
            }
            _ => Err(AppError::Unauthorized("Session closed".to_string())),
        }
    }

    /// Cierra una sesión
    pub async fn logout(&self, user: &UserInfo, client_ip: Option<String>) -> bool {
        let closed = self.sessions.write().await.remove(&user.id).is_some();
        self.record(LoginActivity {
            id: Uuid::new_v4(),
            user_id: Some(user.id),
            username: user.username.clone(),
            action: LoginAction::Logout,
            success: closed,
            client_ip,
            timestamp: Utc::now(),
        })
        .await;
        closed
    }

    pub async fn list_users(&self) -> Vec<UserInfo> {
        let mut users: Vec<UserInfo> = self.users.read().await.values().map(|u| u.info.clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// Obtiene todas las sesiones activas (para monitoreo)
    pub async fn active_sessions(&self) -> Vec<SessionInfo> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn recent_activity(&self, limit: Option<usize>) -> Vec<LoginActivity> {
        self.activity
            .read()
            .await
            .iter()
            .take(limit.unwrap_or(ACTIVITY_LOG_CAPACITY))
            .cloned()
            .collect()
    }

    async fn record(&self, entry: LoginActivity) {
        let mut activity = self.activity.write().await;
        activity.push_front(entry);
        activity.truncate(ACTIVITY_LOG_CAPACITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::environment::EnvironmentConfig;

    async fn seeded_service() -> AuthService {
        let service = AuthService::new(JwtService::from_environment(&EnvironmentConfig::default()), 4);
        service.seed_demo_users().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let service = seeded_service().await;

        let response = service.login("Manager", "manager123", None).await.unwrap();
        assert_eq!(response.user.role, UserRole::FleetManager);
        assert_eq!(response.token_type, "Bearer");

        let user = service.authenticate(&response.token).await.unwrap();
        assert_eq!(user.username, "manager");
        assert_eq!(service.active_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_login_is_recorded() {
        let service = seeded_service().await;

        let result = service.login("admin", "wrong_password", Some("10.0.0.1".to_string())).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert!(service.login("ghost", "whatever", None).await.is_err());

        let activity = service.recent_activity(None).await;
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].username, "ghost");
        assert!(activity[0].user_id.is_none());
        assert!(!activity[1].success);
        assert_eq!(activity[1].client_ip.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let service = seeded_service().await;
        let response = service.login("driver", "driver123", None).await.unwrap();

        assert!(service.logout(&response.user, None).await);
        assert!(matches!(
            service.authenticate(&response.token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_token_from_closed_session_stays_invalid_after_new_login() {
        let service = seeded_service().await;
        let first = service.login("driver", "driver123", None).await.unwrap();
        assert!(service.logout(&first.user, None).await);

        let second = service.login("driver", "driver123", None).await.unwrap();
        assert!(service.authenticate(&second.token).await.is_ok());
        assert!(matches!(
            service.authenticate(&first.token).await,
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(service.active_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() {
        let service = seeded_service().await;
        let request = RegisterUserRequest {
            username: "ADMIN".to_string(),
            password: "password123".to_string(),
            full_name: "Copy".to_string(),
            role: UserRole::Driver,
        };
        assert!(matches!(service.register(request).await, Err(AppError::Conflict(_))));
        assert_eq!(service.list_users().await.len(), 3);
    }
}

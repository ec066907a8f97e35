use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::controllers::auth_controller::{
    get_active_sessions, list_users, login, login_activity, logout, me, register_user,
};
use crate::middleware::auth::auth_middleware;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Configura las rutas de autenticación
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_middleware,
        ));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/sessions", get(get_active_sessions))
        .route("/activity", get(login_activity))
        .route("/users", get(list_users).post(register_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    public.merge(protected)
}

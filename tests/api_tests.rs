use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use fleet_tracking::config::environment::EnvironmentConfig;
use fleet_tracking::services::location_sink::LoggingLocationSink;
use fleet_tracking::services::notification_service::LogNotifier;
use fleet_tracking::{create_router, AppState};

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

async fn create_test_app() -> TestApp {
    let config = EnvironmentConfig {
        bcrypt_cost: 4,
        seed_demo_fleet: true,
        ..EnvironmentConfig::default()
    };
    let state = AppState::with_outputs(config, Arc::new(LoggingLocationSink), Arc::new(LogNotifier)).unwrap();
    state.seed_demo_data().await.unwrap();

    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["map_attached"], true);
    assert_eq!(body["tracking"]["refresh"]["interval_ms"], 5000);
    assert_eq!(body["tracking"]["geofence"]["interval_ms"], 10000);
}

#[tokio::test]
async fn test_login_with_invalid_credentials() {
    let app = create_test_app().await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "not-the-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app().await;
    for uri in ["/api/vehicles", "/api/geofences", "/api/map/markers", "/api/tracking/status"] {
        let (status, _) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_driver_cannot_mutate_fleet() {
    let app = create_test_app().await;
    let token = app.login("driver", "driver123").await;

    let (status, body) = app.send(Method::GET, "/api/vehicles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "7ชซ-1111" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_vehicle_lifecycle_keeps_markers_in_sync() {
    let app = create_test_app().await;
    let token = app.login("manager", "manager123").await;
    let initial_markers = app.state.reconciler.marker_count().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({
                "license_plate": "7ชซ-1111",
                "driver_name": "Test Driver",
                "status": "active",
                "latitude": 13.75,
                "longitude": 100.55
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["marker"]["outcome"], "created");
    let id = body["data"]["vehicle"]["id"].as_str().unwrap().to_string();
    assert_eq!(app.state.reconciler.marker_count().await, initial_markers + 1);

    // Matrícula repetida
    let (status, _) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "7ชซ-1111" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/vehicles/{}", id),
            Some(&token),
            Some(json!({ "latitude": 13.76, "longitude": 100.56 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["marker"]["outcome"], "moved");

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/vehicles/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["marker"]["outcome"], "removed");
    assert_eq!(app.state.reconciler.marker_count().await, initial_markers);

    let (status, _) = app
        .send(Method::GET, &format!("/api/vehicles/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_vehicle_is_rejected() {
    let app = create_test_app().await;
    let token = app.login("admin", "admin123").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "7ชซ-2222", "latitude": 123.0, "longitude": 100.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}

#[tokio::test]
async fn test_geofence_create_and_delete() {
    let app = create_test_app().await;
    let token = app.login("manager", "manager123").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/geofences",
            Some(&token),
            Some(json!({
                "name": "Warehouse",
                "center_lat": 13.70,
                "center_lng": 100.50,
                "radius_meters": 750.0,
                "mode": "both",
                "push_notification": true
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, list) = app.send(Method::GET, "/api/geofences", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 4);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/geofences/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::GET, &format!("/api/geofences/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_ticks_and_detached_map() {
    let app = create_test_app().await;
    let token = app.login("manager", "manager123").await;

    let (status, body) = app
        .send(Method::POST, "/api/tracking/refresh/tick", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");

    let (status, body) = app
        .send(Method::POST, "/api/tracking/geofence/tick", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["geofences_evaluated"], 3);

    let (status, _) = app.send(Method::POST, "/api/map/detach", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state.reconciler.marker_count().await, 0);

    let (_, body) = app
        .send(Method::POST, "/api/tracking/refresh/tick", Some(&token), None)
        .await;
    assert_eq!(body["outcome"], "skipped");
    assert_eq!(body["report"], "map_unavailable");

    let (status, _) = app
        .send(Method::POST, "/api/tracking/unknown/tick", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_loops_start_and_stop() {
    let app = create_test_app().await;
    let token = app.login("admin", "admin123").await;

    let (_, body) = app
        .send(Method::POST, "/api/tracking/refresh/start", Some(&token), None)
        .await;
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(body["data"]["status"]["refresh"]["running"], true);

    let (_, body) = app
        .send(Method::POST, "/api/tracking/refresh/start", Some(&token), None)
        .await;
    assert_eq!(body["data"]["changed"], false);

    let (_, body) = app
        .send(Method::POST, "/api/tracking/refresh/stop", Some(&token), None)
        .await;
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(body["data"]["status"]["refresh"]["running"], false);
}

#[tokio::test]
async fn test_logout_closes_session() {
    let app = create_test_app().await;
    let token = app.login("driver", "driver123").await;

    let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_issued_before_logout_stays_rejected() {
    let app = create_test_app().await;
    let old_token = app.login("driver", "driver123").await;
    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&old_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let new_token = app.login("driver", "driver123").await;
    let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&new_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&old_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = create_test_app().await;
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("fleet_map_markers"));
}

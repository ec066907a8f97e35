use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use fleet_tracking::config::environment::EnvironmentConfig;
use fleet_tracking::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚚 Fleet Tracking - Seguimiento de vehículos en tiempo real");
    info!("==========================================================");

    let config = EnvironmentConfig::from_env()?;
    let addr: SocketAddr = config.server_url().parse()?;

    let app_state = AppState::new(config)?;
    app_state.seed_demo_data().await?;

    // Arrancar los bucles de refresco y de geocercas
    app_state.tracking.start_all().await;
    let tracking = app_state.tracking.clone();

    let app = create_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("   GET  /metrics - Métricas Prometheus");
    info!("🔐 Auth:");
    info!("   POST /api/auth/login - Login");
    info!("   POST /api/auth/logout - Logout");
    info!("   GET  /api/auth/me - Usuario actual");
    info!("🚗 Vehículos:");
    info!("   GET  /api/vehicles - Listar vehículos");
    info!("   POST /api/vehicles - Crear vehículo");
    info!("   PUT  /api/vehicles - Reemplazar flota");
    info!("   GET|PUT|DELETE /api/vehicles/:id");
    info!("📍 Geocercas:");
    info!("   GET|POST /api/geofences");
    info!("   GET|DELETE /api/geofences/violations");
    info!("   GET|PATCH|DELETE /api/geofences/:id");
    info!("🗺️ Mapa:");
    info!("   GET  /api/map/markers - Marcadores GeoJSON");
    info!("   POST /api/map/focus - Enfocar vehículo");
    info!("   POST /api/map/attach | /api/map/detach");
    info!("⏱️ Seguimiento:");
    info!("   GET  /api/tracking/status");
    info!("   POST /api/tracking/:loop/start | stop | tick");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    tracking.stop_all().await;
    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}

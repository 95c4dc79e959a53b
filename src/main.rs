use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_ops::config::{DatabaseConfig, EnvironmentConfig};
use fleet_ops::services::auth_service::AuthService;
use fleet_ops::store::PgStore;
use fleet_ops::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🚚 Fleet Ops API");
    info!("================");

    let config = EnvironmentConfig::from_env()?;
    let database = DatabaseConfig::from_env()?;

    info!("🗄️ Connecting to {}", database.masked_url());
    let pool = database.create_pool().await.map_err(|e| {
        error!("❌ Could not connect to the database: {}", e);
        e
    })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running database migrations")?;
    info!("✅ Migrations applied");

    let state = AppState::new(Arc::new(PgStore::new(pool)), config);
    bootstrap_admin(&state).await?;

    let addr: SocketAddr = state
        .config
        .server_url()
        .parse()
        .with_context(|| format!("invalid listen address {}", state.config.server_url()))?;
    let app = create_router(state);

    info!("🌐 Listening on http://{}", addr);
    info!("   GET  /health");
    info!("   POST /api/auth/login, GET /api/auth/me");
    info!("   /api/vehicles, /api/drivers, /api/trips, /api/maintenance, /api/expenses");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Server error: {}", e);
            e
        })?;

    info!("👋 Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fleet_ops=debug,tower_http=info"));

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Create the first admin from ADMIN_EMAIL / ADMIN_PASSWORD when both are set
async fn bootstrap_admin(state: &AppState) -> Result<()> {
    let (Some(email), Some(password)) = (
        state.config.admin_email.as_deref(),
        state.config.admin_password.as_deref(),
    ) else {
        warn!("ADMIN_EMAIL / ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(());
    };

    let service = AuthService::new(state.gateway(), state.jwt_config());
    service.ensure_admin(email, password).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("🛑 Ctrl+C received, shutting down"),
        _ = terminate => info!("🛑 SIGTERM received, shutting down"),
    }
}

//! Sealguard Server — application entry point.

mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use sealguard_api::error::ApiError;
use sealguard_api::state::AppState;
use sealguard_core::error::{SealguardError, SealguardResult};
use sealguard_core::models::user::{CreateUser, UserRole};
use sealguard_core::repository::UserRepository;
use sealguard_db::DbManager;
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("sealguard=info".parse().unwrap()),
        )
        .json()
        .init();

    info!("Starting Sealguard server...");

    let config = AppConfig::from_env();

    let manager = DbManager::connect(&config.db)
        .await
        .expect("Failed to connect to database");

    sealguard_db::run_migrations(manager.client())
        .await
        .expect("Failed to run migrations");

    info!("Database migrations complete");

    let state = Arc::new(AppState::new(manager.client().clone(), config.auth.clone()));

    ensure_admin(&state, &config)
        .await
        .expect("Failed to provision initial admin user");

    let app = sealguard_api::router(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .load_shed()
                .buffer(config.rate_limit_max as usize)
                .rate_limit(
                    config.rate_limit_max,
                    Duration::from_millis(config.rate_limit_window_ms),
                ),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Sealguard server stopped.");
}

/// Requests shed by the rate-limit stack surface as
/// RATE_LIMIT_EXCEEDED; anything else from the middleware stack is an
/// internal error.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::load_shed::error::Overloaded>() {
        ApiError(SealguardError::RateLimited)
    } else {
        ApiError(SealguardError::Internal(err.to_string()))
    }
}

/// Provision the initial SUPER_ADMIN account on boot when configured
/// and not already present.
async fn ensure_admin(state: &Arc<AppState>, config: &AppConfig) -> SealguardResult<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
    else {
        return Ok(());
    };

    match state.users.get_by_username(username).await {
        Ok(_) => Ok(()),
        Err(SealguardError::NotFound { .. }) => {
            sealguard_auth::password::check_password_policy(password, &config.auth)
                .map_err(SealguardError::from)?;
            let user = state
                .users
                .create(CreateUser {
                    username: username.clone(),
                    password: password.clone(),
                    full_name: None,
                    role: UserRole::SuperAdmin,
                })
                .await?;
            info!(username = %user.username, "Provisioned initial admin user");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, shutting down gracefully");
}

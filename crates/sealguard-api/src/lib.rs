//! Sealguard API — axum HTTP layer.
//!
//! Sets up routes, middleware, and shared state. Typed request
//! structures are validated at the boundary; every response uses the
//! `{success, data | error}` envelope.

pub mod audit;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the application router.
///
/// Three tiers: public (health, login), authenticated (everything
/// else), and the `/api/v1/admin` subtree which additionally requires
/// an admin role. Mutating station/pump routes enforce the admin role
/// in their handlers, where the audit snapshot is taken anyway.
pub fn router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/v1/auth/login", post(routes::auth::login));

    let admin = Router::new()
        .route("/analytics", get(routes::admin::get_analytics))
        .route("/audit-logs", get(routes::admin::get_audit_logs))
        .route("/verifications/all", get(routes::admin::get_all_verifications))
        .route("/stations/{id}/logs", get(routes::admin::get_station_logs))
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    let protected = Router::new()
        .route("/api/v1/auth/logout", post(routes::auth::logout))
        .route("/api/v1/auth/me", get(routes::auth::me))
        .route(
            "/api/v1/stations",
            get(routes::stations::list_stations).post(routes::stations::create_station),
        )
        .route(
            "/api/v1/stations/{id}",
            get(routes::stations::get_station)
                .put(routes::stations::update_station)
                .delete(routes::stations::delete_station),
        )
        .route(
            "/api/v1/stations/{id}/pumps",
            get(routes::pumps::list_station_pumps).post(routes::pumps::create_pump),
        )
        .route(
            "/api/v1/pumps/{id}",
            get(routes::pumps::get_pump)
                .put(routes::pumps::update_pump)
                .delete(routes::pumps::delete_pump),
        )
        .route(
            "/api/v1/pumps/{id}/verify",
            post(routes::verifications::verify_pump),
        )
        .route(
            "/api/v1/pumps/{id}/verifications",
            get(routes::verifications::get_pump_verifications),
        )
        .route(
            "/api/v1/verifications/{session_id}",
            get(routes::verifications::get_verification_session),
        )
        .nest("/api/v1/admin", admin)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    public.merge(protected).with_state(state)
}

//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (auth, CORS, compression,
//! tracing), and creates the axum router ready for serving.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::auth;
use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints; everything under /v1
    // sits behind the bearer/loopback gate.
    let api_v1 = Router::new()
        // Dispatch trigger for the external minute scheduler
        .route("/reminders/run", get(handlers::run_reminders))
        // Schedule settings
        .route("/reminders/settings", get(handlers::get_settings))
        .route("/reminders/settings", post(handlers::update_settings))
        // Absence preview
        .route("/reminders/absences", get(handlers::list_absences))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_auth,
        ));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

//! Route definitions for the router server.
//!
//! A flat route table plus the middleware stack (CORS, request id, request
//! logging, server-error logging, tracing), mirroring the shape the teacher
//! crate used for its own API surface.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, state::AppState};

/// Build the complete Axum router with state and middleware attached.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::banner))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/register", post(handlers::register))
        .route("/query", post(handlers::submit_query))
        .route("/request", get(handlers::poll))
        .route(
            "/response",
            get(handlers::get_responses).post(handlers::submit_response),
        )
        .route("/end", post(handlers::end_query))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::error_logging_middleware))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::node_id_echo_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}

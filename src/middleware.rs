//! Middleware layer for the router server
//!
//! Provides:
//! - CORS configuration
//! - Request ID tracking
//! - Request logging and tracing
//! - Server-error logging

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};
use uuid::Uuid;

/// Request ID header name
pub const X_REQUEST_ID: &str = "x-request-id";

/// Caller-asserted node identity header name.
pub const X_NODE_ID: &str = "x-node-id";

/// Echoes whatever `x-node-id` the caller sent back onto the response,
/// per spec §6 ("The server echoes it back on every response").
pub async fn node_id_echo_middleware(request: Request, next: Next) -> Response {
    let node_id = request
        .headers()
        .get(X_NODE_ID)
        .cloned();

    let mut response = next.run(request).await;

    if let Some(node_id) = node_id {
        response.headers_mut().insert(X_NODE_ID, node_id);
    }

    response
}

/// Configure CORS middleware.
///
/// The spec calls for all origins, methods, and headers with credentials
/// allowed. The CORS protocol forbids combining `allow_credentials` with a
/// literal wildcard (`Any`) on origin, methods, *or* headers — tower-http
/// asserts this on every request and panics if violated. Origins are
/// reflected via `mirror_request` (every origin accepted, but named
/// explicitly rather than sent as `*`); methods and headers get the
/// explicit lists below for the same reason.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderValue::from_static(X_REQUEST_ID),
            HeaderValue::from_static(X_NODE_ID),
        ])
        .expose_headers([
            HeaderValue::from_static(X_REQUEST_ID),
            HeaderValue::from_static(X_NODE_ID),
        ])
        .allow_credentials(true)
}

/// Request ID middleware
///
/// Generates or extracts a unique request ID for tracking requests through
/// the system. The request ID is added to all log messages and returned in
/// the response headers.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    response.headers_mut().insert(
        X_REQUEST_ID,
        HeaderValue::from_str(&request_id.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("invalid-uuid")),
    );

    response
}

/// Request logging middleware
///
/// Logs all incoming requests with method, URI, and response status,
/// tagged with the request id for correlation.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let node_id = request
        .headers()
        .get("x-node-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let status = response.status();
    let level = match status.as_u16() {
        500..=599 => tracing::Level::ERROR,
        400..=499 => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    };

    tracing::event!(
        level,
        method = %method,
        uri = %uri,
        node_id = node_id.as_deref().unwrap_or("-"),
        status = %status.as_u16(),
        duration_ms = elapsed.as_millis() as u64,
        "request completed"
    );

    response
}

/// Logs, but does not otherwise alter, responses that carry a server error.
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let uri = request.uri().clone();
    let response = next.run(request).await;

    if response.status().is_server_error() {
        error!(uri = %uri, status = %response.status().as_u16(), "server error");
    }

    response
}

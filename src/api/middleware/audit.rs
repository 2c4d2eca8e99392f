//! Access logging middleware.
//!
//! Logs every API request with method, path, response status, latency and
//! the active session's user, if any.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::ApiContext;

/// Log API access for the audit trail.
/// Reads `ApiContext` from request extensions.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let ctx = req.extensions().get::<ApiContext>().cloned();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let user_id = ctx
        .and_then(|ctx| ctx.core.session_summary().ok().flatten())
        .map(|s| s.user_id.to_string());

    tracing::info!(
        %method,
        %path,
        status,
        elapsed_ms,
        user_id = user_id.as_deref().unwrap_or("-"),
        "API access"
    );

    response
}

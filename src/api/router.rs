//! Intake API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Layers (outermost → innermost): Extension → CORS → Cache-Control → Audit

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the intake API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn intake_api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/session",
            get(endpoints::session::current)
                .post(endpoints::session::start)
                .delete(endpoints::session::end),
        )
        .route("/drugs/common", get(endpoints::drugs::common))
        .route("/drugs/pricing", get(endpoints::drugs::preview))
        .route("/intake/details", get(endpoints::details::view))
        .route("/intake/clinics", post(endpoints::details::create_clinic))
        .route(
            "/intake/clinics/:id",
            post(endpoints::details::add_clinic).delete(endpoints::details::remove_clinic),
        )
        .route("/intake/providers", post(endpoints::details::create_provider))
        .route(
            "/intake/providers/:id",
            get(endpoints::details::provider_detail)
                .post(endpoints::details::add_provider)
                .delete(endpoints::details::remove_provider),
        )
        .route("/intake/drug", post(endpoints::details::submit_drug))
        .route("/intake/programs", get(endpoints::programs::view))
        .route(
            "/intake/programs/:id/enroll",
            post(endpoints::programs::enroll),
        )
        .route(
            "/intake/programs/:id/select",
            post(endpoints::programs::select),
        )
        .route(
            "/intake/programs/:id/status",
            put(endpoints::programs::change_status),
        )
        .route(
            "/intake/programs/:id/complete",
            post(endpoints::programs::quick_complete),
        )
        .route(
            "/intake/completion",
            post(endpoints::programs::submit_completion)
                .delete(endpoints::programs::cancel_completion),
        )
        .route("/intake/logout", post(endpoints::session::logout))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx));

    Router::new().nest("/api", api)
}

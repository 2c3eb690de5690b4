//! REST API module using Axum
//!
//! HTTP surface for the feedback core:
//! - `/api/v1/feedback*` for signed-in readers
//! - `/api/v1/admin/feedback*` for the admin dashboard
//! - `/health` for liveness checks
//!
//! Identity arrives as `X-User-*` headers from the upstream auth gateway.

pub mod envelope;
pub mod handlers;
mod routes;
pub mod session;

pub use handlers::AppState;
pub use session::CurrentSession;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::Response;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// `server.cors_origins` lists the origins allowed for development
/// (e.g. `http://localhost:5173` for a local front-end dev server).
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(session::USER_ID_HEADER),
            HeaderName::from_static(session::USER_NAME_HEADER),
            HeaderName::from_static(session::PHONE_NUMBER_HEADER),
            HeaderName::from_static(session::USER_TYPE_HEADER),
        ]);

    if origins.is_empty() {
        return base;
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    tracing::info!(origins = ?origins, "CORS: allowing configured origins");
    base.allow_origin(allowed)
}

async fn no_such_route() -> Response {
    envelope::ApiErrorResponse::not_found("no such route")
}

/// Create the complete application router.
pub fn create_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::health_routes(state))
        .fallback(no_such_route)
        .layer(RequestBodyLimitLayer::new(defaults::MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(cors_origins))
}

//! HTTP router for the symptom checker.
//!
//! Layers (outermost → innermost): CORS → audit logger → handler.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the service router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn diagnosis_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(endpoints::health::index))
        .route("/health", get(endpoints::health::check))
        .route("/diagnose", post(endpoints::diagnose::diagnose))
        .route("/analyze", post(endpoints::diagnose::diagnose))
        .route("/conditions", get(endpoints::conditions::list))
        .route("/conditions/:key", get(endpoints::conditions::detail))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(CorsLayer::permissive())
}

//! Service index and health check.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config::{APP_NAME, APP_VERSION};

pub const ENDPOINTS: &[&str] = &[
    "GET /health",
    "POST /diagnose",
    "POST /analyze",
    "GET /conditions",
    "GET /conditions/:key",
];

#[derive(Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub endpoints: &'static [&'static str],
}

/// `GET /`: what this service is and what it serves.
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        service: APP_NAME,
        status: "running",
        version: APP_VERSION,
        endpoints: ENDPOINTS,
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub strategy: &'static str,
    pub conditions: Vec<String>,
    pub lexicon_available: bool,
    pub uptime_secs: i64,
}

/// `GET /health`: liveness plus what the engine was loaded with.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: APP_VERSION,
        strategy: ctx.diagnoser.name(),
        conditions: ctx
            .knowledge
            .conditions()
            .map(|c| c.display_name.clone())
            .collect(),
        lexicon_available: ctx.lexicon_available,
        uptime_secs: ctx.uptime_secs(),
    })
}

//! HTTP surface of the symptom checker.
//!
//! Thin adapter over a [`Diagnoser`](crate::diagnosis::Diagnoser): input
//! validation, JSON shapes, status mapping, CORS and access logging.
//! The router is composable; `diagnosis_router()` returns a `Router` that
//! can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::diagnosis_router;
pub use server::{start_api_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;

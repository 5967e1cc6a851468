//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the backpack service behind the handlers
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response DTOs and JSON mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServicesHandle) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

/// Shared handle the handlers extract.
pub type AppServicesHandle = Arc<services::AppServices>;

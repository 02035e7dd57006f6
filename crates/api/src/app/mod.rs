//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: collaborator wiring (stores, bucket, mailer, pipeline)
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent `{error, code}` JSON error responses

use std::sync::Arc;

use axum::http::Method;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app() -> Router {
    let services = Arc::new(services::build_services().await);
    build_app_with_services(services)
}

/// Build the router over pre-built services (tests inject in-memory wiring
/// and seed events directly).
pub fn build_app_with_services(services: Arc<services::AppServices>) -> Router {
    // Anonymous public endpoint: every origin may POST.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)).layer(cors))
}

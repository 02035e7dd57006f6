use axum::Router;

pub mod public;
pub mod system;

/// Router for the anonymous public endpoints.
pub fn router() -> Router {
    Router::new().merge(public::router())
}

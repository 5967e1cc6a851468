use axum::Router;

pub mod characters;
pub mod system;

/// Router for all resource endpoints.
pub fn router() -> Router {
    Router::new().nest("/characters", characters::router())
}

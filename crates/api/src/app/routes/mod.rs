use axum::Router;

pub mod residents;
pub mod system;

/// Router for all resident endpoints.
pub fn router() -> Router {
    Router::new().nest("/residents", residents::router())
}

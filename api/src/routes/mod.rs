//! API route registration.

pub mod health;
pub mod reports;

use axum::{Router, routing::get};

/// Builds the `/api` router.
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health::health))
        .nest("/reports", reports::routes())
}

//! Report generation endpoints.
//!
//! - `POST /api/reports`: run the full pipeline and return the PDF.
//! - `POST /api/reports/summary`: normalize and aggregate only, returning
//!   the overview metrics as JSON (the dashboard's data view).

pub mod post;

use axum::{Router, routing::post as post_method};

pub fn routes() -> Router {
    Router::new()
        .route("/", post_method(post::generate_report))
        .route("/summary", post_method(post::report_summary))
}

pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::pagination::handlers as pagination;
use crate::scheduler::handlers as preview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // One-shot pagination
        .route("/api/v1/paginate", post(pagination::handle_paginate))
        // Live preview
        .route("/api/v1/preview/content", put(preview::handle_put_content))
        .route("/api/v1/preview/capacity", put(preview::handle_put_capacity))
        .route("/api/v1/preview/pages", get(preview::handle_get_pages))
        .with_state(state)
}

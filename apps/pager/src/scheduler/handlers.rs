//! Axum route handlers for the live preview.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pagination::handlers::PaginateResponse;
use crate::pagination::{ContentBlock, PageCapacity};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewContentRequest {
    pub root: ContentBlock,
}

#[derive(Debug, Deserialize)]
pub struct PreviewCapacityRequest {
    pub capacity: f32,
}

#[derive(Debug, Serialize)]
pub struct ScheduledResponse {
    pub revision: u64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub run_id: Uuid,
    pub revision: u64,
    pub completed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub pagination: PaginateResponse,
}

/// PUT /api/v1/preview/content
///
/// A rejected tree leaves the current preview and its pages untouched.
pub async fn handle_put_content(
    State(state): State<AppState>,
    Json(request): Json<PreviewContentRequest>,
) -> Result<(StatusCode, Json<ScheduledResponse>), AppError> {
    request
        .root
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state.preview.replace(request.root).await;
    let revision = state.scheduler.request_repagination();
    Ok((
        StatusCode::ACCEPTED,
        Json(ScheduledResponse {
            revision,
            status: "scheduled",
        }),
    ))
}

/// PUT /api/v1/preview/capacity
pub async fn handle_put_capacity(
    State(state): State<AppState>,
    Json(request): Json<PreviewCapacityRequest>,
) -> Result<(StatusCode, Json<ScheduledResponse>), AppError> {
    let capacity = PageCapacity::new(request.capacity)?;
    let revision = state.scheduler.set_capacity(capacity);
    Ok((
        StatusCode::ACCEPTED,
        Json(ScheduledResponse {
            revision,
            status: "scheduled",
        }),
    ))
}

/// GET /api/v1/preview/pages
///
/// Returns the most recent completed pass.
pub async fn handle_get_pages(
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, AppError> {
    let snapshot = state
        .scheduler
        .latest()
        .ok_or_else(|| AppError::NotFound("No pagination pass has completed yet".to_string()))?;

    Ok(Json(PreviewResponse {
        run_id: snapshot.run_id,
        revision: snapshot.revision,
        completed_at: snapshot.completed_at,
        pagination: PaginateResponse::from(&snapshot.result),
    }))
}

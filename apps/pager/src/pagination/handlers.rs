//! Axum route handler for one-shot pagination.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::pagination::{paginate, ContentBlock, PageCapacity, PaginationResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PaginateRequest {
    /// Measured tree; its children are the top-level blocks.
    pub root: ContentBlock,
    /// Overrides the configured capacity, in CSS pixels.
    #[serde(default)]
    pub capacity: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub fragments: Vec<String>,
    pub used_height: f32,
    pub overflowed: bool,
}

#[derive(Debug, Serialize)]
pub struct PaginateResponse {
    pub page_count: usize,
    pub capacity: f32,
    pub unmeasured_blocks: usize,
    pub pages: Vec<PageView>,
}

impl From<&PaginationResult> for PaginateResponse {
    fn from(result: &PaginationResult) -> Self {
        Self {
            page_count: result.page_count(),
            capacity: result.capacity.get(),
            unmeasured_blocks: result.unmeasured_blocks,
            pages: result
                .pages
                .iter()
                .map(|page| PageView {
                    fragments: page.markup(),
                    used_height: page.used_height,
                    overflowed: page.overflowed,
                })
                .collect(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/paginate
///
/// Paginates the posted tree and returns its pages. Stateless: nothing is retained.
pub async fn handle_paginate(
    State(state): State<AppState>,
    Json(request): Json<PaginateRequest>,
) -> Result<Json<PaginateResponse>, AppError> {
    request
        .root
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let capacity = match request.capacity {
        Some(px) => PageCapacity::new(px)?,
        None => state.config.page_capacity,
    };

    let root = request.root;
    let result = tokio::task::spawn_blocking(move || paginate(&root, capacity))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in pagination: {e}")))?;

    Ok(Json(PaginateResponse::from(&result)))
}

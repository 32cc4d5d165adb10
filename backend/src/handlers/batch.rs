//! HTTP handlers for batch management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{BatchStatus, BatchUpdate, NewBatch},
    services::BatchService,
    AppState,
};
use shared::Pagination;

/// Query parameters for listing batches
#[derive(Debug, Deserialize)]
pub struct ListBatchesQuery {
    pub status: Option<BatchStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListBatchesQuery {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
    }
}

/// Create a new batch
pub async fn create_batch(
    State(state): State<AppState>,
    Json(input): Json<NewBatch>,
) -> AppResult<impl IntoResponse> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.create_batch(input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// List batches
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<ListBatchesQuery>,
) -> AppResult<impl IntoResponse> {
    let service = BatchService::new(state.db, state.clock);
    let batches = service
        .list_batches(query.status, query.pagination())
        .await?;
    Ok(Json(batches))
}

/// Get batch by ID
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.get_batch(batch_id).await?;
    Ok(Json(batch))
}

/// Get a batch with its evaluated state
pub async fn get_batch_state(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.get_batch_state(batch_id).await?;
    Ok(Json(batch))
}

/// Update batch fields
pub async fn update_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(update): Json<BatchUpdate>,
) -> AppResult<impl IntoResponse> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.update_batch(batch_id, update).await?;
    Ok(Json(batch))
}

/// Delete a batch with its snapshots and analyses
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = BatchService::new(state.db, state.clock);
    service.delete_batch(batch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! HTTP handlers for measurement snapshots

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::NewInterval,
    services::{AnalysisService, IntervalService},
    AppState,
};

/// Record a snapshot and request its analysis in the background
pub async fn create_interval(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<NewInterval>,
) -> AppResult<impl IntoResponse> {
    let service = IntervalService::new(state.db.clone(), state.clock.clone());
    let interval = service.create_interval(batch_id, input).await?;

    AnalysisService::from_state(&state).spawn_analysis(batch_id, interval.id);

    Ok((StatusCode::CREATED, Json(interval)))
}

/// List snapshots with their correlated analyses
pub async fn list_intervals(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = IntervalService::new(state.db, state.clock);
    let snapshots = service.list_correlated(batch_id).await?;
    Ok(Json(snapshots))
}

/// Delete a snapshot
pub async fn delete_interval(
    State(state): State<AppState>,
    Path((batch_id, interval_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let service = IntervalService::new(state.db, state.clock);
    service.delete_interval(batch_id, interval_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

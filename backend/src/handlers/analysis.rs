//! HTTP handlers for batch analysis

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppResult, services::AnalysisService, AppState};

/// Body for an on-demand analysis
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestAnalysisInput {
    pub interval_id: Option<Uuid>,
}

/// Request an analysis now and return it once stored
pub async fn request_analysis(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    input: Option<Json<RequestAnalysisInput>>,
) -> AppResult<impl IntoResponse> {
    let interval_id = input.and_then(|Json(body)| body.interval_id);
    let service = AnalysisService::from_state(&state);
    let analysis = service.request_analysis(batch_id, interval_id).await?;
    Ok((StatusCode::CREATED, Json(analysis)))
}

/// List analyses for a batch
pub async fn list_analyses(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = AnalysisService::from_state(&state);
    let analyses = service.list_analyses(batch_id).await?;
    Ok(Json(analyses))
}

/// Average health score and trend
pub async fn get_health_summary(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = AnalysisService::from_state(&state);
    let summary = service.health_summary(batch_id).await?;
    Ok(Json(summary))
}

//! HTTP handlers for follow-up reminders

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppResult, services::ReminderService, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ReminderQuery {
    #[serde(default)]
    pub active: bool,
    /// Evaluation instant; defaults to the server clock
    pub now: Option<DateTime<Utc>>,
}

/// Reminders for a batch
pub async fn list_batch_reminders(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Query(query): Query<ReminderQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReminderService::new(state.db, state.clock);
    let reminders = service
        .batch_reminders(batch_id, query.active, query.now)
        .await?;
    Ok(Json(reminders))
}

/// Active reminders across all batches
pub async fn list_active_reminders(
    State(state): State<AppState>,
    Query(query): Query<ReminderQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReminderService::new(state.db, state.clock);
    let reminders = service.all_active_reminders(query.now).await?;
    Ok(Json(reminders))
}

//! Batch analysis service
//!
//! Requests analyses from the text-generation service, stores them and
//! attaches them to the snapshot that triggered them. A failed or malformed
//! generation leaves every stored record untouched and is never retried here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::text_generation::build_prompt;
use crate::external::TextGenerationClient;
use crate::models::{Analysis, AnalysisPayload};
use crate::services::batch::{ensure_batch_exists, BatchService};
use crate::services::interval::{attach_analysis, fetch_intervals};
use crate::services::rate_limit::FixedWindowRateLimiter;
use crate::AppState;
use shared::{summarize, Clock, HealthSummary};

/// Service for AI batch analysis
#[derive(Clone)]
pub struct AnalysisService {
    db: PgPool,
    clock: Arc<dyn Clock>,
    client: Option<TextGenerationClient>,
    rate_limiter: Arc<FixedWindowRateLimiter>,
}

/// Database row for an analysis
#[derive(Debug, sqlx::FromRow)]
struct AnalysisRow {
    id: Uuid,
    batch_id: Uuid,
    interval_id: Option<Uuid>,
    insight: String,
    recommendations: Vec<String>,
    alerts: Vec<String>,
    health_score: i32,
    analyzed_data: serde_json::Value,
    analyzed_at: DateTime<Utc>,
}

impl From<AnalysisRow> for Analysis {
    fn from(row: AnalysisRow) -> Self {
        Analysis {
            id: row.id,
            batch_id: row.batch_id,
            interval_id: row.interval_id,
            insight: row.insight,
            recommendations: row.recommendations,
            alerts: row.alerts,
            health_score: row.health_score,
            analyzed_data: row.analyzed_data,
            analyzed_at: row.analyzed_at,
        }
    }
}

impl AnalysisService {
    /// Create a new AnalysisService instance
    pub fn new(
        db: PgPool,
        clock: Arc<dyn Clock>,
        client: Option<TextGenerationClient>,
        rate_limiter: Arc<FixedWindowRateLimiter>,
    ) -> Self {
        Self {
            db,
            clock,
            client,
            rate_limiter,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            state.clock.clone(),
            state.text_generation.clone(),
            state.rate_limiter.clone(),
        )
    }

    /// Request an analysis now and wait for it
    pub async fn request_analysis(
        &self,
        batch_id: Uuid,
        interval_id: Option<Uuid>,
    ) -> AppResult<Analysis> {
        let client = self
            .client
            .as_ref()
            .ok_or(AppError::TextGenerationUnavailable)?;

        let batch = BatchService::new(self.db.clone(), self.clock.clone())
            .get_batch(batch_id)
            .await?;
        self.rate_limiter.acquire()?;

        let history = fetch_intervals(&self.db, batch_id).await?;
        let prompt = build_prompt(&batch, &history);

        tracing::debug!(batch_id = %batch_id, readings = history.len(), "Requesting analysis");
        let text = client.generate(&prompt).await?;

        let payload = AnalysisPayload::parse(&text).map_err(|e| {
            tracing::warn!(batch_id = %batch_id, error = %e, "Discarding malformed analysis");
            AppError::from(e)
        })?;

        let analysis = Analysis::from_payload(
            batch_id,
            interval_id,
            payload,
            prompt.data,
            self.clock.now(),
        );
        let analysis = self.store_analysis(&analysis).await?;

        if let Some(interval_id) = interval_id {
            let attached = attach_analysis(&self.db, interval_id, &analysis).await?;
            if !attached {
                tracing::debug!(
                    interval_id = %interval_id,
                    "Snapshot missing or already analyzed, analysis kept unattached"
                );
            }
        }

        tracing::info!(
            batch_id = %batch_id,
            analysis_id = %analysis.id,
            health_score = analysis.health_score,
            "Analysis stored"
        );
        Ok(analysis)
    }

    /// Fire-and-forget analysis for a freshly recorded snapshot
    pub fn spawn_analysis(&self, batch_id: Uuid, interval_id: Uuid) {
        if self.client.is_none() {
            tracing::debug!(batch_id = %batch_id, "Text generation disabled, skipping analysis");
            return;
        }

        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.request_analysis(batch_id, Some(interval_id)).await {
                tracing::warn!(
                    batch_id = %batch_id,
                    interval_id = %interval_id,
                    error = %e,
                    "Background analysis failed; snapshot left without insight"
                );
            }
        });
    }

    /// Analyses for a batch, oldest first
    pub async fn list_analyses(&self, batch_id: Uuid) -> AppResult<Vec<Analysis>> {
        ensure_batch_exists(&self.db, batch_id).await?;
        fetch_analyses(&self.db, batch_id).await
    }

    /// Average health score and trend for a batch
    pub async fn health_summary(&self, batch_id: Uuid) -> AppResult<HealthSummary> {
        ensure_batch_exists(&self.db, batch_id).await?;
        let intervals = fetch_intervals(&self.db, batch_id).await?;
        let analyses = fetch_analyses(&self.db, batch_id).await?;
        Ok(summarize(batch_id, &intervals, &analyses))
    }

    async fn store_analysis(&self, analysis: &Analysis) -> AppResult<Analysis> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO analyses (id, batch_id, interval_id, insight, recommendations, alerts,
                                  health_score, analyzed_data, analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, batch_id, interval_id, insight, recommendations, alerts,
                      health_score, analyzed_data, analyzed_at
            "#,
        )
        .bind(analysis.id)
        .bind(analysis.batch_id)
        .bind(analysis.interval_id)
        .bind(&analysis.insight)
        .bind(&analysis.recommendations)
        .bind(&analysis.alerts)
        .bind(analysis.health_score)
        .bind(&analysis.analyzed_data)
        .bind(analysis.analyzed_at)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}

/// Analyses for a batch, oldest first
pub(crate) async fn fetch_analyses(db: &PgPool, batch_id: Uuid) -> AppResult<Vec<Analysis>> {
    let rows = sqlx::query_as::<_, AnalysisRow>(
        r#"
        SELECT id, batch_id, interval_id, insight, recommendations, alerts,
               health_score, analyzed_data, analyzed_at
        FROM analyses
        WHERE batch_id = $1
        ORDER BY analyzed_at ASC
        "#,
    )
    .bind(batch_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(Analysis::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::FixedClock;
    use sqlx::postgres::PgPoolOptions;

    fn service_without_client() -> AnalysisService {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/kombucha_test")
            .unwrap();
        AnalysisService::new(
            db,
            Arc::new(FixedClock(Utc::now())),
            None,
            Arc::new(FixedWindowRateLimiter::default()),
        )
    }

    #[test]
    fn test_request_without_client_is_unavailable() {
        tokio_test::block_on(async {
            let service = service_without_client();
            let result = service.request_analysis(Uuid::new_v4(), None).await;
            assert!(matches!(result, Err(AppError::TextGenerationUnavailable)));
        });
    }

    #[test]
    fn test_rejected_request_does_not_consume_quota() {
        tokio_test::block_on(async {
            let service = service_without_client();
            let limiter = Arc::new(FixedWindowRateLimiter::new(1, std::time::Duration::from_secs(60)));
            let service = AnalysisService {
                rate_limiter: limiter.clone(),
                ..service
            };
            let _ = service.request_analysis(Uuid::new_v4(), None).await;
            assert!(limiter.acquire().is_ok());
        });
    }
}

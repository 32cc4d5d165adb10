//! Measurement snapshot service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Analysis, Interval, NewInterval, Note};
use crate::services::analysis::fetch_analyses;
use crate::services::batch::{ensure_batch_exists, note_to_db};
use shared::{attach_all, validate_new_interval, Clock, CorrelatedSnapshot};

/// Service for recording and reading measurement snapshots
#[derive(Clone)]
pub struct IntervalService {
    db: PgPool,
    clock: Arc<dyn Clock>,
}

const INTERVAL_COLUMNS: &str = "id, batch_id, recorded_at, ph, brix, temperature_f, \
    taste_notes, visual_notes, aroma_notes, ai_insight, health_score, recommendations, created_at";

/// Database row for a snapshot
#[derive(Debug, sqlx::FromRow)]
struct IntervalRow {
    id: Uuid,
    batch_id: Uuid,
    recorded_at: DateTime<Utc>,
    ph: Option<Decimal>,
    brix: Option<Decimal>,
    temperature_f: Option<Decimal>,
    taste_notes: Option<serde_json::Value>,
    visual_notes: Option<serde_json::Value>,
    aroma_notes: Option<serde_json::Value>,
    ai_insight: Option<String>,
    health_score: Option<i32>,
    recommendations: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<IntervalRow> for Interval {
    fn from(row: IntervalRow) -> Self {
        Interval {
            id: row.id,
            batch_id: row.batch_id,
            recorded_at: row.recorded_at,
            ph: row.ph,
            brix: row.brix,
            temperature_f: row.temperature_f,
            taste_notes: note_from_db(row.taste_notes),
            visual_notes: note_from_db(row.visual_notes),
            aroma_notes: note_from_db(row.aroma_notes),
            ai_insight: row.ai_insight,
            health_score: row.health_score,
            recommendations: row.recommendations,
            created_at: row.created_at,
        }
    }
}

fn note_from_db(value: Option<serde_json::Value>) -> Option<Note> {
    value.and_then(|v| serde_json::from_value(v).ok())
}

impl IntervalService {
    /// Create a new IntervalService instance
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Record a snapshot for a batch
    pub async fn create_interval(&self, batch_id: Uuid, input: NewInterval) -> AppResult<Interval> {
        validate_new_interval(&input)?;
        ensure_batch_exists(&self.db, batch_id).await?;

        let interval = Interval::new(batch_id, input, self.clock.now());
        if !interval.has_readings() {
            return Err(AppError::ValidationError(
                "A snapshot needs at least one reading or note".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, IntervalRow>(&format!(
            r#"
            INSERT INTO intervals ({INTERVAL_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {INTERVAL_COLUMNS}
            "#
        ))
        .bind(interval.id)
        .bind(interval.batch_id)
        .bind(interval.recorded_at)
        .bind(interval.ph)
        .bind(interval.brix)
        .bind(interval.temperature_f)
        .bind(note_to_db(&interval.taste_notes)?)
        .bind(note_to_db(&interval.visual_notes)?)
        .bind(note_to_db(&interval.aroma_notes)?)
        .bind(&interval.ai_insight)
        .bind(interval.health_score)
        .bind(&interval.recommendations)
        .bind(interval.created_at)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(batch_id = %batch_id, interval_id = %interval.id, "Snapshot recorded");
        Ok(row.into())
    }

    /// Snapshots for a batch in recorded order
    pub async fn list_intervals(&self, batch_id: Uuid) -> AppResult<Vec<Interval>> {
        ensure_batch_exists(&self.db, batch_id).await?;
        fetch_intervals(&self.db, batch_id).await
    }

    /// Snapshots merged with their correlated analyses
    pub async fn list_correlated(&self, batch_id: Uuid) -> AppResult<Vec<CorrelatedSnapshot>> {
        let intervals = self.list_intervals(batch_id).await?;
        let analyses = fetch_analyses(&self.db, batch_id).await?;
        Ok(attach_all(&intervals, &analyses))
    }

    /// Delete a snapshot
    pub async fn delete_interval(&self, batch_id: Uuid, interval_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM intervals WHERE id = $1 AND batch_id = $2")
            .bind(interval_id)
            .bind(batch_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Snapshot".to_string()));
        }

        tracing::info!(batch_id = %batch_id, interval_id = %interval_id, "Snapshot deleted");
        Ok(())
    }
}

/// Snapshots for a batch in recorded order
pub(crate) async fn fetch_intervals(db: &PgPool, batch_id: Uuid) -> AppResult<Vec<Interval>> {
    let rows = sqlx::query_as::<_, IntervalRow>(&format!(
        r#"
        SELECT {INTERVAL_COLUMNS}
        FROM intervals
        WHERE batch_id = $1
        ORDER BY recorded_at ASC, created_at ASC
        "#
    ))
    .bind(batch_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(Interval::from).collect())
}

/// Copy an analysis onto its snapshot unless one is already attached
pub(crate) async fn attach_analysis(
    db: &PgPool,
    interval_id: Uuid,
    analysis: &Analysis,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE intervals
        SET ai_insight = $1, health_score = $2, recommendations = $3
        WHERE id = $4 AND batch_id = $5 AND health_score IS NULL AND ai_insight IS NULL
        "#,
    )
    .bind(&analysis.insight)
    .bind(analysis.health_score)
    .bind(&analysis.recommendations)
    .bind(interval_id)
    .bind(analysis.batch_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

//! Batch management service
//!
//! Every write goes through [`shared::status::refresh_derived`] and stores
//! the recomputed cache in the same statement as the field change.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Batch, BatchStatus, BatchUpdate, CarbonationStatus, NewBatch, Note};
use shared::{
    assess_alcohol_estimate, evaluate, is_safe_starting_ph, refresh_derived,
    validate_batch_update, validate_new_batch, BatchState, Clock, PaginatedResponse, Pagination,
};

/// Batch service for managing fermentation batches
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
    clock: Arc<dyn Clock>,
}

pub(crate) const BATCH_COLUMNS: &str = "id, name, start_date, brew_size_gallons, tea_type, sugar_type, \
    start_ph, start_brix, end_ph, end_brix, taste_profile, primary_complete, \
    secondary_start_date, flavoring_method, filtering_method, carbonation_status, \
    target_co2_volumes, carbonation_temp_f, packaging_date, ready_to_bottle, pasteurized, \
    final_ph, final_brix, final_taste_notes, notes, \
    progress_percentage, status, alcohol_estimate, force_carb_psi, carb_time_estimate_hours, \
    created_at, updated_at";

/// Database row for a batch
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BatchRow {
    id: Uuid,
    name: String,
    start_date: NaiveDate,
    brew_size_gallons: Decimal,
    tea_type: String,
    sugar_type: String,
    start_ph: Option<Decimal>,
    start_brix: Option<Decimal>,
    end_ph: Option<Decimal>,
    end_brix: Option<Decimal>,
    taste_profile: Option<String>,
    primary_complete: bool,
    secondary_start_date: Option<NaiveDate>,
    flavoring_method: Option<String>,
    filtering_method: Option<String>,
    carbonation_status: Option<String>,
    target_co2_volumes: Option<Decimal>,
    carbonation_temp_f: Option<Decimal>,
    packaging_date: Option<NaiveDate>,
    ready_to_bottle: bool,
    pasteurized: bool,
    final_ph: Option<Decimal>,
    final_brix: Option<Decimal>,
    final_taste_notes: Option<serde_json::Value>,
    notes: Option<String>,
    progress_percentage: i32,
    status: String,
    alcohol_estimate: Option<Decimal>,
    force_carb_psi: Option<Decimal>,
    carb_time_estimate_hours: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        let mut batch = Batch {
            id: row.id,
            name: row.name,
            start_date: row.start_date,
            brew_size_gallons: row.brew_size_gallons,
            tea_type: row.tea_type,
            sugar_type: row.sugar_type,
            start_ph: row.start_ph,
            start_brix: row.start_brix,
            end_ph: row.end_ph,
            end_brix: row.end_brix,
            taste_profile: row.taste_profile,
            primary_complete: row.primary_complete,
            secondary_start_date: row.secondary_start_date,
            flavoring_method: row.flavoring_method,
            filtering_method: row.filtering_method,
            carbonation_status: row
                .carbonation_status
                .as_deref()
                .and_then(CarbonationStatus::from_str),
            target_co2_volumes: row.target_co2_volumes,
            carbonation_temp_f: row.carbonation_temp_f,
            packaging_date: row.packaging_date,
            ready_to_bottle: row.ready_to_bottle,
            pasteurized: row.pasteurized,
            final_ph: row.final_ph,
            final_brix: row.final_brix,
            final_taste_notes: row
                .final_taste_notes
                .and_then(|v| serde_json::from_value::<Note>(v).ok()),
            notes: row.notes,
            progress_percentage: row.progress_percentage,
            status: BatchStatus::from_str(&row.status).unwrap_or_default(),
            alcohol_estimate: row.alcohol_estimate,
            force_carb_psi: row.force_carb_psi,
            carb_time_estimate_hours: row.carb_time_estimate_hours,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        // The stored derived fields are only a cache; reads always see fresh values.
        let cached = (batch.progress_percentage, batch.status);
        refresh_derived(&mut batch);
        if cached != (batch.progress_percentage, batch.status) {
            tracing::warn!(
                batch_id = %batch.id,
                stored_status = %cached.1,
                derived_status = %batch.status,
                "Stored batch status was stale, using derived value"
            );
        }
        batch
    }
}

/// Batch with its evaluated state
#[derive(Debug, Clone, Serialize)]
pub struct BatchWithState {
    #[serde(flatten)]
    pub batch: Batch,
    pub state: BatchState,
}

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Create a batch with derived fields computed from its initial readings
    pub async fn create_batch(&self, input: NewBatch) -> AppResult<Batch> {
        validate_new_batch(&input)?;

        let batch = Batch::new(input, self.clock.now());
        let final_taste_notes = note_to_db(&batch.final_taste_notes)?;

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO batches ({BATCH_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32)
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(batch.id)
        .bind(&batch.name)
        .bind(batch.start_date)
        .bind(batch.brew_size_gallons)
        .bind(&batch.tea_type)
        .bind(&batch.sugar_type)
        .bind(batch.start_ph)
        .bind(batch.start_brix)
        .bind(batch.end_ph)
        .bind(batch.end_brix)
        .bind(&batch.taste_profile)
        .bind(batch.primary_complete)
        .bind(batch.secondary_start_date)
        .bind(&batch.flavoring_method)
        .bind(&batch.filtering_method)
        .bind(batch.carbonation_status.map(|c| c.as_str()))
        .bind(batch.target_co2_volumes)
        .bind(batch.carbonation_temp_f)
        .bind(batch.packaging_date)
        .bind(batch.ready_to_bottle)
        .bind(batch.pasteurized)
        .bind(batch.final_ph)
        .bind(batch.final_brix)
        .bind(&final_taste_notes)
        .bind(&batch.notes)
        .bind(batch.progress_percentage)
        .bind(batch.status.as_str())
        .bind(batch.alcohol_estimate)
        .bind(batch.force_carb_psi)
        .bind(batch.carb_time_estimate_hours)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .fetch_one(&self.db)
        .await?;

        if let Some(ph) = batch.start_ph.filter(|ph| !is_safe_starting_ph(*ph)) {
            tracing::warn!(batch_id = %batch.id, start_ph = %ph, "Starting pH above 4.6, add more starter");
        }
        tracing::info!(batch_id = %batch.id, name = %batch.name, "Batch created");
        Ok(row.into())
    }

    /// Apply a field update and persist the recomputed status in the same transaction
    pub async fn update_batch(&self, batch_id: Uuid, update: BatchUpdate) -> AppResult<Batch> {
        validate_batch_update(&update)?;

        let mut tx = self.db.begin().await?;
        let mut batch = fetch_for_update(&mut tx, batch_id).await?;
        let previous_status = batch.status;

        batch.apply_update(update, self.clock.now());
        warn_on_inverted_alcohol(&batch);

        let final_taste_notes = note_to_db(&batch.final_taste_notes)?;
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE batches
            SET name = $2, start_ph = $3, start_brix = $4, end_ph = $5, end_brix = $6,
                taste_profile = $7, primary_complete = $8, secondary_start_date = $9,
                flavoring_method = $10, filtering_method = $11, carbonation_status = $12,
                target_co2_volumes = $13, carbonation_temp_f = $14, packaging_date = $15,
                ready_to_bottle = $16, pasteurized = $17, final_ph = $18, final_brix = $19,
                final_taste_notes = $20, notes = $21, progress_percentage = $22, status = $23,
                alcohol_estimate = $24, force_carb_psi = $25, carb_time_estimate_hours = $26,
                updated_at = $27
            WHERE id = $1
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(batch.id)
        .bind(&batch.name)
        .bind(batch.start_ph)
        .bind(batch.start_brix)
        .bind(batch.end_ph)
        .bind(batch.end_brix)
        .bind(&batch.taste_profile)
        .bind(batch.primary_complete)
        .bind(batch.secondary_start_date)
        .bind(&batch.flavoring_method)
        .bind(&batch.filtering_method)
        .bind(batch.carbonation_status.map(|c| c.as_str()))
        .bind(batch.target_co2_volumes)
        .bind(batch.carbonation_temp_f)
        .bind(batch.packaging_date)
        .bind(batch.ready_to_bottle)
        .bind(batch.pasteurized)
        .bind(batch.final_ph)
        .bind(batch.final_brix)
        .bind(&final_taste_notes)
        .bind(&batch.notes)
        .bind(batch.progress_percentage)
        .bind(batch.status.as_str())
        .bind(batch.alcohol_estimate)
        .bind(batch.force_carb_psi)
        .bind(batch.carb_time_estimate_hours)
        .bind(batch.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if previous_status != batch.status {
            tracing::info!(
                batch_id = %batch.id,
                from = %previous_status,
                to = %batch.status,
                progress = batch.progress_percentage,
                "Batch status changed"
            );
        }

        Ok(row.into())
    }

    /// Get batch by ID
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<Batch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1"
        ))
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(row.into())
    }

    /// Get batch with its evaluated state
    pub async fn get_batch_state(&self, batch_id: Uuid) -> AppResult<BatchWithState> {
        let batch = self.get_batch(batch_id).await?;
        let state = evaluate(&batch);
        Ok(BatchWithState { batch, state })
    }

    /// List batches, newest first.
    ///
    /// A status filter is applied to the freshly derived status, not the
    /// stored column, so it pages in memory over all batches.
    pub async fn list_batches(
        &self,
        status: Option<BatchStatus>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Batch>> {
        if let Some(status) = status {
            let batches = self.list_all_batches().await?;
            return Ok(page_by_status(batches, status, &pagination));
        }

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM batches")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches
            ORDER BY start_date DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(i64::from(pagination.limit()))
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        let batches = rows.into_iter().map(Batch::from).collect();
        Ok(PaginatedResponse::new(batches, &pagination, total.max(0) as u64))
    }

    /// All batches, for reminder evaluation
    pub async fn list_all_batches(&self) -> AppResult<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches ORDER BY start_date DESC, created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }

    /// Delete a batch; intervals and analyses cascade
    pub async fn delete_batch(&self, batch_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM batches WHERE id = $1")
            .bind(batch_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Batch".to_string()));
        }

        tracing::info!(batch_id = %batch_id, "Batch deleted");
        Ok(())
    }
}

/// Fail with NotFound unless the batch exists
pub(crate) async fn ensure_batch_exists(db: &PgPool, batch_id: Uuid) -> AppResult<()> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM batches WHERE id = $1)")
            .bind(batch_id)
            .fetch_one(db)
            .await?;

    if !exists {
        return Err(AppError::NotFound("Batch".to_string()));
    }
    Ok(())
}

async fn fetch_for_update(tx: &mut Transaction<'_, Postgres>, batch_id: Uuid) -> AppResult<Batch> {
    let row = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1 FOR UPDATE"
    ))
    .bind(batch_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

    Ok(row.into())
}

/// One page of the batches whose derived status matches
fn page_by_status(
    batches: Vec<Batch>,
    status: BatchStatus,
    pagination: &Pagination,
) -> PaginatedResponse<Batch> {
    let matching: Vec<Batch> = batches.into_iter().filter(|b| b.status == status).collect();
    let total = matching.len() as u64;
    let page = matching
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .collect();
    PaginatedResponse::new(page, pagination, total)
}

pub(crate) fn note_to_db(note: &Option<Note>) -> AppResult<Option<serde_json::Value>> {
    note.as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn warn_on_inverted_alcohol(batch: &Batch) {
    if let (Some(start), Some(end)) = (batch.start_brix, batch.end_brix) {
        let estimate = assess_alcohol_estimate(start, end);
        if estimate.is_inverted() {
            tracing::warn!(
                batch_id = %batch.id,
                start_brix = %start,
                end_brix = %end,
                estimate = %estimate.value(),
                "End Brix is above start Brix, alcohol estimate is negative"
            );
        }
    }
}

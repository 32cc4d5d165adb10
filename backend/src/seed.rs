//! Demo data for development databases

use chrono::{Days, Duration};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{BatchUpdate, NewBatch, NewInterval, RawNote};
use crate::services::{BatchService, IntervalService};
use shared::Clock;

const DEMO_BATCH_NAME: &str = "Demo black tea";

/// Insert a demo batch with a few snapshots unless one already exists
pub async fn seed_demo_batch(db: &PgPool, clock: Arc<dyn Clock>) -> AppResult<()> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM batches WHERE name = $1")
        .bind(DEMO_BATCH_NAME)
        .fetch_one(db)
        .await?;
    if existing > 0 {
        tracing::debug!("Demo batch already present, skipping seed");
        return Ok(());
    }

    let now = clock.now();
    let start_date = now
        .date_naive()
        .checked_sub_days(Days::new(5))
        .unwrap_or_else(|| now.date_naive());

    let batches = BatchService::new(db.clone(), clock.clone());
    let batch = batches
        .create_batch(NewBatch {
            name: DEMO_BATCH_NAME.to_string(),
            start_date,
            brew_size_gallons: Decimal::from(1),
            tea_type: "Black".to_string(),
            sugar_type: "Cane".to_string(),
            start_ph: Some(Decimal::new(45, 1)),
            start_brix: Some(Decimal::from(8)),
            notes: Some("Seeded for local development".to_string()),
        })
        .await?;

    let intervals = IntervalService::new(db.clone(), clock);
    let readings = [
        (4, Decimal::new(41, 1), Decimal::from(7), "sweet"),
        (2, Decimal::new(36, 1), Decimal::from(5), "slightly tart"),
        (0, Decimal::new(32, 1), Decimal::new(35, 1), "tangy"),
    ];
    for (days_ago, ph, brix, taste) in readings {
        intervals
            .create_interval(
                batch.id,
                NewInterval {
                    recorded_at: Some(now - Duration::days(days_ago)),
                    ph: Some(ph),
                    brix: Some(brix),
                    temperature_f: Some(Decimal::from(76)),
                    taste_notes: Some(RawNote::Text(taste.to_string())),
                    visual_notes: None,
                    aroma_notes: Some(RawNote::Tags(vec!["vinegar".into(), "fruity".into()])),
                },
            )
            .await?;
    }

    batches
        .update_batch(
            batch.id,
            BatchUpdate {
                end_ph: Some(Some(Decimal::new(32, 1))),
                end_brix: Some(Some(Decimal::new(35, 1))),
                taste_profile: Some(Some("Tangy+Dry".to_string())),
                ..Default::default()
            },
        )
        .await?;

    tracing::info!(batch_id = %batch.id, "Seeded demo batch");
    Ok(())
}

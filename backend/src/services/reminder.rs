//! Reminder service

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Reminder;
use crate::services::batch::BatchService;
use shared::{active_reminders, active_reminders_for, generate_reminders, Clock};

/// Service computing follow-up reminders from stored batches
#[derive(Clone)]
pub struct ReminderService {
    batches: BatchService,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            batches: BatchService::new(db, clock.clone()),
            clock,
        }
    }

    /// Reminders for one batch; `active_only` keeps those due at `now`
    pub async fn batch_reminders(
        &self,
        batch_id: Uuid,
        active_only: bool,
        now: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Reminder>> {
        let batch = self.batches.get_batch(batch_id).await?;
        let reminders = generate_reminders(&batch);

        if active_only {
            let now = now.unwrap_or_else(|| self.clock.now());
            Ok(active_reminders(reminders, now))
        } else {
            Ok(reminders)
        }
    }

    /// Due reminders across every batch
    pub async fn all_active_reminders(
        &self,
        now: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Reminder>> {
        let now = now.unwrap_or_else(|| self.clock.now());
        let batches = self.batches.list_all_batches().await?;
        let active = active_reminders_for(&batches, now);

        tracing::debug!(batches = batches.len(), active = active.len(), "Evaluated reminders");
        Ok(active)
    }
}

//! Follow-up reminder generation
//!
//! Reminders are a pure function of the batch. They are rebuilt on every
//! call and must not be cached across batch updates.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::models::{Batch, Reminder, ReminderKind};

/// Days after the start date to log end-of-primary pH and Brix
pub const PH_BRIX_AFTER_DAYS: u64 = 2;

/// Days after the start date to check bottling readiness
pub const BOTTLING_CHECK_AFTER_DAYS: u64 = 7;

/// Days after the secondary start date to log final measurements
pub const FINAL_MEASUREMENTS_AFTER_DAYS: u64 = 2;

/// All reminders for a batch, complete or not
pub fn generate_reminders(batch: &Batch) -> Vec<Reminder> {
    let mut reminders = vec![
        reminder(
            batch,
            ReminderKind::PhBrix,
            add_days(batch.start_date, PH_BRIX_AFTER_DAYS),
            format!("Log pH and Brix readings for {}", batch.name),
            batch.end_ph.is_some() && batch.end_brix.is_some(),
        ),
        reminder(
            batch,
            ReminderKind::BottlingCheck,
            add_days(batch.start_date, BOTTLING_CHECK_AFTER_DAYS),
            format!("Check whether {} is ready to bottle", batch.name),
            batch.ready_to_bottle,
        ),
    ];

    if let Some(secondary_start) = batch.secondary_start_date {
        reminders.push(reminder(
            batch,
            ReminderKind::FinalMeasurements,
            add_days(secondary_start, FINAL_MEASUREMENTS_AFTER_DAYS),
            format!("Log final pH and Brix for {}", batch.name),
            batch.final_ph.is_some() && batch.final_brix.is_some(),
        ));
    }

    reminders
}

/// Incomplete reminders whose trigger date has arrived
pub fn active_reminders(reminders: Vec<Reminder>, now: DateTime<Utc>) -> Vec<Reminder> {
    let today = now.date_naive();
    reminders
        .into_iter()
        .filter(|r| !r.completed && r.trigger_date <= today)
        .collect()
}

/// Active reminders across many batches, oldest trigger first
pub fn active_reminders_for<'a>(
    batches: impl IntoIterator<Item = &'a Batch>,
    now: DateTime<Utc>,
) -> Vec<Reminder> {
    let mut active: Vec<Reminder> = batches
        .into_iter()
        .flat_map(|b| active_reminders(generate_reminders(b), now))
        .collect();
    active.sort_by(|a, b| a.trigger_date.cmp(&b.trigger_date).then_with(|| a.id.cmp(&b.id)));
    active
}

fn reminder(
    batch: &Batch,
    kind: ReminderKind,
    trigger_date: NaiveDate,
    message: String,
    completed: bool,
) -> Reminder {
    Reminder {
        id: Reminder::reminder_id(batch.id, kind),
        batch_id: batch.id,
        message,
        trigger_date,
        completed,
        kind,
    }
}

// Saturates at the calendar's end instead of panicking on absurd dates.
fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

//! Reminder generation tests for the kombucha batch tracker

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    active_reminders, active_reminders_for, generate_reminders, Batch, BatchUpdate, NewBatch,
    Reminder, ReminderKind,
};

fn batch_started(start_date: NaiveDate) -> Batch {
    Batch::new(
        NewBatch {
            name: "Jasmine".to_string(),
            start_date,
            brew_size_gallons: Decimal::from(1),
            tea_type: "Green".to_string(),
            sugar_type: "Cane".to_string(),
            start_ph: Some(Decimal::new(45, 1)),
            start_brix: Some(Decimal::from(8)),
            notes: None,
        },
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn kinds(reminders: &[Reminder]) -> Vec<ReminderKind> {
    reminders.iter().map(|r| r.kind).collect()
}

// ============================================================================
// Generation
// ============================================================================

#[test]
fn test_new_batch_has_two_reminders() {
    let batch = batch_started(start());
    let reminders = generate_reminders(&batch);

    assert_eq!(
        kinds(&reminders),
        vec![ReminderKind::PhBrix, ReminderKind::BottlingCheck]
    );
    assert_eq!(reminders[0].trigger_date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    assert_eq!(reminders[1].trigger_date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    assert_eq!(reminders[0].id, format!("{}-ph-brix", batch.id));
}

#[test]
fn test_secondary_start_adds_final_measurements() {
    let mut batch = batch_started(start());
    batch.apply_update(
        BatchUpdate {
            secondary_start_date: Some(Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())),
            ..Default::default()
        },
        at(10, 8),
    );

    let reminders = generate_reminders(&batch);
    let last = reminders.last().unwrap();
    assert_eq!(last.kind, ReminderKind::FinalMeasurements);
    assert_eq!(last.trigger_date, NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
    assert!(!last.completed);
}

#[test]
fn test_ids_are_stable_across_calls() {
    let batch = batch_started(start());
    assert_eq!(generate_reminders(&batch), generate_reminders(&batch));
}

// ============================================================================
// Activation
// ============================================================================

#[test]
fn test_ph_brix_active_from_day_two() {
    let batch = batch_started(start());

    assert!(active_reminders(generate_reminders(&batch), at(2, 23)).is_empty());

    let active = active_reminders(generate_reminders(&batch), at(3, 0));
    assert_eq!(kinds(&active), vec![ReminderKind::PhBrix]);
}

#[test]
fn test_ph_brix_clears_once_end_readings_logged() {
    let mut batch = batch_started(start());
    batch.apply_update(
        BatchUpdate {
            end_ph: Some(Some(Decimal::new(31, 1))),
            end_brix: Some(Some(Decimal::from(2))),
            ..Default::default()
        },
        at(3, 9),
    );

    let reminders = generate_reminders(&batch);
    assert!(reminders[0].completed);
    assert!(active_reminders(reminders, at(3, 12)).is_empty());
}

#[test]
fn test_one_end_reading_is_not_enough() {
    let mut batch = batch_started(start());
    batch.apply_update(
        BatchUpdate {
            end_ph: Some(Some(Decimal::new(31, 1))),
            ..Default::default()
        },
        at(3, 9),
    );

    let active = active_reminders(generate_reminders(&batch), at(3, 12));
    assert_eq!(kinds(&active), vec![ReminderKind::PhBrix]);
}

#[test]
fn test_ready_to_bottle_completes_bottling_check() {
    let mut batch = batch_started(start());
    batch.apply_update(
        BatchUpdate {
            ready_to_bottle: Some(true),
            ..Default::default()
        },
        at(8, 9),
    );

    let active = active_reminders(generate_reminders(&batch), at(9, 9));
    assert_eq!(kinds(&active), vec![ReminderKind::PhBrix]);
}

#[test]
fn test_active_across_batches_sorted_by_trigger() {
    let older = batch_started(start());
    let newer = batch_started(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());

    let active = active_reminders_for([&newer, &older], at(9, 0));
    let dates: Vec<NaiveDate> = active.iter().map(|r| r.trigger_date).collect();
    let mut sorted = dates.clone();
    sorted.sort();

    assert_eq!(active.len(), 3);
    assert_eq!(dates, sorted);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A reminder is active exactly when it is incomplete and due
    #[test]
    fn active_means_due_and_incomplete(start_offset in 0u64..60, now_offset in 0u64..90) {
        let start_date = start() + chrono::Days::new(start_offset);
        let batch = batch_started(start_date);
        let now = at(1, 12) + chrono::Duration::days(now_offset as i64);

        let all = generate_reminders(&batch);
        let active = active_reminders(all.clone(), now);
        for reminder in &all {
            let due = !reminder.completed && reminder.trigger_date <= now.date_naive();
            prop_assert_eq!(active.contains(reminder), due);
        }
    }
}

//! Batch state machine
//!
//! Progress is the sum of four 25% milestones evaluated against the fields
//! currently populated on a batch. Status follows from progress, except that
//! an unsafe or over-fermented final pH always forces `needs-attention`.
//!
//! ```text
//! needs-attention -> in-progress -> ready -> complete
//!        ^______________ safety override ______|
//! ```

use serde::{Deserialize, Serialize};

use crate::calculator::{
    assess_alcohol_estimate, carb_time_estimate_hours, force_carb_psi, is_over_fermented,
    is_unsafe_to_bottle, primary_ferment_complete,
};
use crate::models::{is_filled, Batch, BatchStatus, CarbonationStatus};

/// Weight of each milestone
pub const MILESTONE_WEIGHT: i32 = 25;

/// Safety condition raised by the final pH
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SafetyFlag {
    #[default]
    None,
    UnsafeToBottle,
    OverFermented,
}

/// Derived state of a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchState {
    pub progress_percentage: i32,
    pub status: BatchStatus,
    pub safety: SafetyFlag,
    /// End-of-primary readings satisfy the completion heuristic
    pub primary_ferment_ready: bool,
}

/// Sum of the four milestone checks: 0, 25, 50, 75 or 100
pub fn progress_percentage(batch: &Batch) -> i32 {
    let milestones = [
        batch.start_ph.is_some() && batch.start_brix.is_some(),
        batch.end_ph.is_some() && batch.end_brix.is_some() && is_filled(&batch.taste_profile),
        is_filled(&batch.flavoring_method) && is_filled(&batch.filtering_method),
        batch.carbonation_status == Some(CarbonationStatus::Complete)
            || batch.packaging_date.is_some(),
    ];

    milestones.iter().filter(|done| **done).count() as i32 * MILESTONE_WEIGHT
}

/// Safety flag from the final pH, if one was recorded
pub fn safety_flag(batch: &Batch) -> SafetyFlag {
    match batch.final_ph {
        Some(ph) if is_unsafe_to_bottle(ph) => SafetyFlag::UnsafeToBottle,
        Some(ph) if is_over_fermented(ph) => SafetyFlag::OverFermented,
        _ => SafetyFlag::None,
    }
}

/// Status from progress and safety, first match wins
pub fn derive_status(progress: i32, safety: SafetyFlag) -> BatchStatus {
    if safety != SafetyFlag::None {
        return BatchStatus::NeedsAttention;
    }
    match progress {
        100 => BatchStatus::Complete,
        p if p >= 50 => BatchStatus::Ready,
        p if p > 0 => BatchStatus::InProgress,
        _ => BatchStatus::NeedsAttention,
    }
}

/// Evaluate a batch without touching it
pub fn evaluate(batch: &Batch) -> BatchState {
    let progress = progress_percentage(batch);
    let safety = safety_flag(batch);
    let primary_ferment_ready = match (batch.end_ph, batch.end_brix, batch.taste_profile.as_deref()) {
        (Some(ph), Some(brix), Some(taste)) => primary_ferment_complete(ph, brix, taste),
        _ => false,
    };

    BatchState {
        progress_percentage: progress,
        status: derive_status(progress, safety),
        safety,
        primary_ferment_ready,
    }
}

/// Recompute every cached field on the batch.
///
/// This is the only writer of `progress_percentage`, `status`,
/// `alcohol_estimate`, `force_carb_psi` and `carb_time_estimate_hours`.
/// Cached values whose inputs are gone are cleared.
pub fn refresh_derived(batch: &mut Batch) -> BatchState {
    let state = evaluate(batch);
    batch.progress_percentage = state.progress_percentage;
    batch.status = state.status;

    batch.alcohol_estimate = match (batch.start_brix, batch.end_brix) {
        (Some(start), Some(end)) => Some(assess_alcohol_estimate(start, end).value()),
        _ => None,
    };

    batch.force_carb_psi = match (batch.carbonation_temp_f, batch.target_co2_volumes) {
        (Some(temp), Some(target)) => Some(force_carb_psi(temp, target)),
        _ => None,
    };
    batch.carb_time_estimate_hours = batch.force_carb_psi.map(carb_time_estimate_hours);

    state
}

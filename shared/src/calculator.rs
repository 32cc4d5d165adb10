//! Derived-quantity calculators
//!
//! Pure functions over batch inputs. Inputs are not validated here: negative
//! or out-of-range values flow through unchanged so that status derivation
//! and the operator can see them. Check ranges with [`crate::validation`]
//! before storing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TasteProfile;

/// Alcohol by volume per degree Brix consumed
pub const ABV_PER_BRIX: Decimal = Decimal::from_parts(59, 0, 0, false, 2);

/// pH at or below which primary fermentation can be considered done
pub const PRIMARY_COMPLETE_MAX_PH: Decimal = Decimal::from_parts(32, 0, 0, false, 1);

/// Brix at or below which primary fermentation can be considered done
pub const PRIMARY_COMPLETE_MAX_BRIX: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Above this pH the brew is not acidic enough to bottle safely
pub const UNSAFE_TO_BOTTLE_PH: Decimal = Decimal::from_parts(40, 0, 0, false, 1);

/// Below this pH the brew has turned to vinegar
pub const OVER_FERMENTED_PH: Decimal = Decimal::from_parts(24, 0, 0, false, 1);

/// Ingredient amounts for a brew size
///
/// Units: starter in fl oz, tea in oz, water in gallons, sugar in cups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrewRatios {
    pub starter_volume: Decimal,
    pub tea_weight: Decimal,
    pub water_volume: Decimal,
    pub sugar_amount: Decimal,
}

/// Ingredient ratios for a brew size in gallons
pub fn brew_ratios(brew_size: Decimal) -> BrewRatios {
    BrewRatios {
        starter_volume: brew_size * Decimal::from(16),
        tea_weight: brew_size * Decimal::from(2),
        water_volume: brew_size,
        sugar_amount: brew_size,
    }
}

/// Estimated ABV from the Brix drop
pub fn alcohol_estimate(start_brix: Decimal, end_brix: Decimal) -> Decimal {
    (start_brix - end_brix) * ABV_PER_BRIX
}

/// Alcohol estimate classified for display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AlcoholEstimate {
    Valid(Decimal),
    /// End Brix above start Brix. The raw negative value is kept.
    Inverted(Decimal),
}

impl AlcoholEstimate {
    pub fn value(&self) -> Decimal {
        match self {
            AlcoholEstimate::Valid(v) | AlcoholEstimate::Inverted(v) => *v,
        }
    }

    pub fn is_inverted(&self) -> bool {
        matches!(self, AlcoholEstimate::Inverted(_))
    }
}

/// Alcohol estimate, flagging inverted readings instead of clamping them
pub fn assess_alcohol_estimate(start_brix: Decimal, end_brix: Decimal) -> AlcoholEstimate {
    let estimate = alcohol_estimate(start_brix, end_brix);
    if estimate.is_sign_negative() && !estimate.is_zero() {
        AlcoholEstimate::Inverted(estimate)
    } else {
        AlcoholEstimate::Valid(estimate)
    }
}

/// Regulator PSI to reach a CO2 volume target at a given temperature (°F)
pub fn force_carb_psi(temp_f: Decimal, target_co2_volumes: Decimal) -> Decimal {
    round_half_up((target_co2_volumes - Decimal::ONE) * (temp_f + Decimal::from(100)) / Decimal::from(50))
}

/// Hours to carbonate at a given PSI
pub fn carb_time_estimate_hours(psi: Decimal) -> Decimal {
    round_half_up(Decimal::from(24) + (psi - Decimal::from(10)) * Decimal::from(2))
}

/// Force-carbonation settings for a temperature and CO2 target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarbonationSettings {
    pub psi: Decimal,
    pub time_estimate_hours: Decimal,
}

pub fn carbonation_settings(temp_f: Decimal, target_co2_volumes: Decimal) -> CarbonationSettings {
    let psi = force_carb_psi(temp_f, target_co2_volumes);
    CarbonationSettings {
        psi,
        time_estimate_hours: carb_time_estimate_hours(psi),
    }
}

/// Whether the end-of-primary readings show the ferment is finished
pub fn primary_ferment_complete(ph: Decimal, brix: Decimal, taste_tag: &str) -> bool {
    ph <= PRIMARY_COMPLETE_MAX_PH
        && brix <= PRIMARY_COMPLETE_MAX_BRIX
        && TasteProfile::parse(taste_tag)
            .map(|t| t.signals_primary_complete())
            .unwrap_or(false)
}

pub fn is_unsafe_to_bottle(ph: Decimal) -> bool {
    ph > UNSAFE_TO_BOTTLE_PH
}

pub fn is_over_fermented(ph: Decimal) -> bool {
    ph < OVER_FERMENTED_PH
}

/// Round half toward positive infinity
fn round_half_up(value: Decimal) -> Decimal {
    (value + Decimal::new(5, 1)).floor()
}

//! Validation utilities for the Kombucha Tracker
//!
//! Range checks applied at the input boundary, before values reach storage.
//! The calculators themselves never reject values.

use rust_decimal::Decimal;
use validator::Validate;

use crate::models::{Batch, BatchUpdate, NewBatch, NewInterval};

/// A rejected input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

// ============================================================================
// Measurement Validations
// ============================================================================

/// Validate pH is on the 0-14 scale
pub fn validate_ph(ph: Decimal) -> Result<(), &'static str> {
    if ph < Decimal::ZERO || ph > Decimal::from(14) {
        return Err("pH must be between 0 and 14");
    }
    Ok(())
}

/// Validate Brix is a percentage
pub fn validate_brix(brix: Decimal) -> Result<(), &'static str> {
    if brix < Decimal::ZERO || brix > Decimal::from(100) {
        return Err("Brix must be between 0 and 100");
    }
    Ok(())
}

/// Validate a liquid temperature in °F
pub fn validate_temperature_f(temp_f: Decimal) -> Result<(), &'static str> {
    if temp_f < Decimal::from(32) || temp_f > Decimal::from(212) {
        return Err("Temperature must be between 32 and 212 °F");
    }
    Ok(())
}

/// Validate brew size in gallons
pub fn validate_brew_size(gallons: Decimal) -> Result<(), &'static str> {
    if gallons <= Decimal::ZERO {
        return Err("Brew size must be positive");
    }
    if gallons > Decimal::from(1000) {
        return Err("Brew size must be at most 1000 gallons");
    }
    Ok(())
}

/// Validate a CO2 volume target
pub fn validate_co2_volumes(volumes: Decimal) -> Result<(), &'static str> {
    if volumes < Decimal::ZERO || volumes > Decimal::from(6) {
        return Err("CO2 volumes must be between 0 and 6");
    }
    Ok(())
}

/// Validate a health score as produced by the model, before rounding
pub fn validate_health_score(score: f64) -> Result<(), &'static str> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err("Health score must be between 0 and 100");
    }
    Ok(())
}

/// Validate a regulator pressure in PSI
pub fn validate_psi(psi: Decimal) -> Result<(), &'static str> {
    if psi < Decimal::ZERO || psi > Decimal::from(60) {
        return Err("PSI must be between 0 and 60");
    }
    Ok(())
}

/// Check the ideal starting pH for a new brew (acidified with starter)
pub fn is_safe_starting_ph(ph: Decimal) -> bool {
    ph <= Decimal::new(46, 1)
}

// ============================================================================
// Input Validations
// ============================================================================

fn check<T: Copy>(
    field: &'static str,
    value: Option<T>,
    rule: fn(T) -> Result<(), &'static str>,
) -> Result<(), FieldError> {
    match value {
        Some(v) => rule(v).map_err(|message| FieldError::new(field, message)),
        None => Ok(()),
    }
}

/// Validate a new batch
pub fn validate_new_batch(input: &NewBatch) -> Result<(), FieldError> {
    if let Err(errors) = input.validate() {
        let field = errors.field_errors().keys().next().copied().unwrap_or("input");
        return Err(FieldError::new(field, "must be between 1 and 100 characters"));
    }
    if input.name.trim().is_empty() {
        return Err(FieldError::new("name", "Batch name is required"));
    }
    validate_brew_size(input.brew_size_gallons)
        .map_err(|message| FieldError::new("brew_size_gallons", message))?;
    check("start_ph", input.start_ph, validate_ph)?;
    check("start_brix", input.start_brix, validate_brix)?;
    Ok(())
}

/// Validate the fields present in a batch update
pub fn validate_batch_update(update: &BatchUpdate) -> Result<(), FieldError> {
    if let Some(name) = &update.name {
        if name.trim().is_empty() || name.len() > 100 {
            return Err(FieldError::new("name", "must be between 1 and 100 characters"));
        }
    }
    check("start_ph", update.start_ph.flatten(), validate_ph)?;
    check("start_brix", update.start_brix.flatten(), validate_brix)?;
    check("end_ph", update.end_ph.flatten(), validate_ph)?;
    check("end_brix", update.end_brix.flatten(), validate_brix)?;
    check("final_ph", update.final_ph.flatten(), validate_ph)?;
    check("final_brix", update.final_brix.flatten(), validate_brix)?;
    check("target_co2_volumes", update.target_co2_volumes.flatten(), validate_co2_volumes)?;
    check("carbonation_temp_f", update.carbonation_temp_f.flatten(), validate_temperature_f)?;
    Ok(())
}

/// Validate every measurement on a full batch record.
///
/// Used where a whole batch arrives from outside (client-side previews),
/// since such records never passed through [`validate_new_batch`] or
/// [`validate_batch_update`].
pub fn validate_batch(batch: &Batch) -> Result<(), FieldError> {
    validate_brew_size(batch.brew_size_gallons)
        .map_err(|message| FieldError::new("brew_size_gallons", message))?;
    check("start_ph", batch.start_ph, validate_ph)?;
    check("start_brix", batch.start_brix, validate_brix)?;
    check("end_ph", batch.end_ph, validate_ph)?;
    check("end_brix", batch.end_brix, validate_brix)?;
    check("final_ph", batch.final_ph, validate_ph)?;
    check("final_brix", batch.final_brix, validate_brix)?;
    check("target_co2_volumes", batch.target_co2_volumes, validate_co2_volumes)?;
    check("carbonation_temp_f", batch.carbonation_temp_f, validate_temperature_f)?;
    Ok(())
}

/// Validate a new measurement snapshot
pub fn validate_new_interval(input: &NewInterval) -> Result<(), FieldError> {
    check("ph", input.ph, validate_ph)?;
    check("brix", input.brix, validate_brix)?;
    check("temperature_f", input.temperature_f, validate_temperature_f)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_batch() -> NewBatch {
        NewBatch {
            name: "Oolong".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            brew_size_gallons: Decimal::from(2),
            tea_type: "Oolong".to_string(),
            sugar_type: "Cane".to_string(),
            start_ph: Some(Decimal::new(45, 1)),
            start_brix: Some(Decimal::from(8)),
            notes: None,
        }
    }

    #[test]
    fn test_validate_ph() {
        assert!(validate_ph(Decimal::ZERO).is_ok());
        assert!(validate_ph(Decimal::new(32, 1)).is_ok());
        assert!(validate_ph(Decimal::from(14)).is_ok());
        assert!(validate_ph(Decimal::new(-1, 1)).is_err());
        assert!(validate_ph(Decimal::new(141, 1)).is_err());
    }

    #[test]
    fn test_validate_brix() {
        assert!(validate_brix(Decimal::from(8)).is_ok());
        assert!(validate_brix(Decimal::from(-1)).is_err());
        assert!(validate_brix(Decimal::from(101)).is_err());
    }

    #[test]
    fn test_validate_temperature() {
        assert!(validate_temperature_f(Decimal::from(75)).is_ok());
        assert!(validate_temperature_f(Decimal::from(20)).is_err());
    }

    #[test]
    fn test_validate_brew_size() {
        assert!(validate_brew_size(Decimal::from(5)).is_ok());
        assert!(validate_brew_size(Decimal::ZERO).is_err());
        assert!(validate_brew_size(Decimal::from(1001)).is_err());
    }

    #[test]
    fn test_validate_health_score() {
        assert!(validate_health_score(0.0).is_ok());
        assert!(validate_health_score(100.0).is_ok());
        assert!(validate_health_score(100.4).is_err());
        assert!(validate_health_score(-0.1).is_err());
        assert!(validate_health_score(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_psi() {
        assert!(validate_psi(Decimal::from(12)).is_ok());
        assert!(validate_psi(Decimal::from(-1)).is_err());
        assert!(validate_psi(Decimal::from(61)).is_err());
    }

    #[test]
    fn test_validate_new_batch() {
        assert!(validate_new_batch(&new_batch()).is_ok());

        let mut blank = new_batch();
        blank.name = "   ".to_string();
        assert_eq!(validate_new_batch(&blank).unwrap_err().field, "name");

        let mut empty_tea = new_batch();
        empty_tea.tea_type = String::new();
        assert_eq!(validate_new_batch(&empty_tea).unwrap_err().field, "tea_type");

        let mut acidic = new_batch();
        acidic.start_ph = Some(Decimal::from(15));
        assert_eq!(validate_new_batch(&acidic).unwrap_err().field, "start_ph");
    }

    #[test]
    fn test_validate_batch_checks_every_reading() {
        let created = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2024, 5, 1, 8, 0, 0).unwrap();
        let batch = Batch::new(new_batch(), created);
        assert!(validate_batch(&batch).is_ok());

        let mut huge = batch.clone();
        huge.start_brix = Some(Decimal::MAX);
        assert_eq!(validate_batch(&huge).unwrap_err().field, "start_brix");

        let mut cold = batch.clone();
        cold.carbonation_temp_f = Some(Decimal::from(-400));
        assert_eq!(validate_batch(&cold).unwrap_err().field, "carbonation_temp_f");

        let mut empty = batch;
        empty.brew_size_gallons = Decimal::ZERO;
        assert_eq!(validate_batch(&empty).unwrap_err().field, "brew_size_gallons");
    }

    #[test]
    fn test_validate_batch_update_ignores_cleared_fields() {
        let update: BatchUpdate =
            serde_json::from_str(r#"{"final_ph": null, "end_brix": 1.5}"#).unwrap();
        assert!(validate_batch_update(&update).is_ok());

        let update: BatchUpdate = serde_json::from_str(r#"{"final_ph": 20}"#).unwrap();
        assert_eq!(validate_batch_update(&update).unwrap_err().field, "final_ph");
    }
}

//! HTTP handlers for the brewing calculators

use axum::{extract::Query, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use shared::{
    assess_alcohol_estimate, brew_ratios, carbonation_settings, validate_brew_size,
    validate_brix, validate_co2_volumes, validate_temperature_f, FieldError,
};

#[derive(Debug, Deserialize)]
pub struct RatiosQuery {
    pub brew_size: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CarbonationQuery {
    pub temp_f: Decimal,
    pub target_co2: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AlcoholQuery {
    pub start_brix: Decimal,
    pub end_brix: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AlcoholResponse {
    pub alcohol_estimate: Decimal,
    /// Final Brix above starting Brix, usually a data-entry mistake
    pub inverted: bool,
}

/// Starter, tea, water and sugar quantities for a brew size
pub async fn get_brew_ratios(Query(query): Query<RatiosQuery>) -> AppResult<impl IntoResponse> {
    validate_brew_size(query.brew_size).map_err(|m| FieldError::new("brew_size", m))?;
    Ok(Json(brew_ratios(query.brew_size)))
}

/// Force-carbonation pressure and time
pub async fn get_carbonation_settings(
    Query(query): Query<CarbonationQuery>,
) -> AppResult<impl IntoResponse> {
    validate_temperature_f(query.temp_f).map_err(|m| FieldError::new("temp_f", m))?;
    validate_co2_volumes(query.target_co2).map_err(|m| FieldError::new("target_co2", m))?;
    Ok(Json(carbonation_settings(query.temp_f, query.target_co2)))
}

/// Alcohol estimate from starting and final Brix
pub async fn get_alcohol_estimate(
    Query(query): Query<AlcoholQuery>,
) -> AppResult<impl IntoResponse> {
    validate_brix(query.start_brix).map_err(|m| FieldError::new("start_brix", m))?;
    validate_brix(query.end_brix).map_err(|m| FieldError::new("end_brix", m))?;

    let estimate = assess_alcohol_estimate(query.start_brix, query.end_brix);
    Ok(Json(AlcoholResponse {
        alcohol_estimate: estimate.value(),
        inverted: estimate.is_inverted(),
    }))
}

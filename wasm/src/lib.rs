//! WebAssembly module for the kombucha batch tracker
//!
//! Provides client-side computation for:
//! - Brew ratio and carbonation calculators
//! - Offline preview of batch progress and status
//! - Reminder evaluation against the browser clock

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

pub use shared::models::*;
pub use shared::validation::*;

use shared::{
    active_reminders, alcohol_estimate, brew_ratios, carb_time_estimate_hours, force_carb_psi,
    generate_reminders, refresh_derived,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("kombucha tracker wasm loaded"));
}

fn to_decimal(value: f64, field: &str) -> Result<Decimal, String> {
    Decimal::try_from(value).map_err(|_| format!("Invalid {}: {}", field, value))
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn parse_batch(batch_json: &str) -> Result<Batch, String> {
    let batch: Batch =
        serde_json::from_str(batch_json).map_err(|e| format!("Invalid batch JSON: {}", e))?;
    validate_batch(&batch).map_err(|e| e.to_string())?;
    Ok(batch)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn checked(
    value: f64,
    field: &str,
    rule: fn(Decimal) -> Result<(), &'static str>,
) -> Result<Decimal, String> {
    let value = to_decimal(value, field)?;
    rule(value).map_err(str::to_string)?;
    Ok(value)
}

fn brew_ratios_json(brew_size_gallons: f64) -> Result<String, String> {
    let gallons = checked(brew_size_gallons, "brew size", validate_brew_size)?;
    to_json(&brew_ratios(gallons))
}

fn alcohol(start_brix: f64, end_brix: f64) -> Result<f64, String> {
    let start = checked(start_brix, "start Brix", validate_brix)?;
    let end = checked(end_brix, "end Brix", validate_brix)?;
    Ok(to_f64(alcohol_estimate(start, end)))
}

fn carb_psi(temp_f: f64, target_co2_volumes: f64) -> Result<f64, String> {
    let temp = checked(temp_f, "temperature", validate_temperature_f)?;
    let volumes = checked(target_co2_volumes, "CO2 volumes", validate_co2_volumes)?;
    Ok(to_f64(force_carb_psi(temp, volumes)))
}

fn carb_hours(psi: f64) -> Result<f64, String> {
    let psi = checked(psi, "PSI", validate_psi)?;
    Ok(to_f64(carb_time_estimate_hours(psi)))
}

fn batch_state_json(batch_json: &str) -> Result<String, String> {
    let mut batch = parse_batch(batch_json)?;
    let state = refresh_derived(&mut batch);
    to_json(&state)
}

fn reminders_json(batch_json: &str, now_ms: f64) -> Result<String, String> {
    let batch = parse_batch(batch_json)?;
    if !now_ms.is_finite() {
        return Err("Timestamp out of range".to_string());
    }
    let now: DateTime<Utc> = DateTime::from_timestamp_millis(now_ms as i64)
        .ok_or_else(|| "Timestamp out of range".to_string())?;
    to_json(&active_reminders(generate_reminders(&batch), now))
}

fn js_err(message: String) -> JsValue {
    JsValue::from_str(&message)
}

/// Starter, tea, water and sugar amounts as JSON
#[wasm_bindgen]
pub fn calculate_brew_ratios(brew_size_gallons: f64) -> Result<String, JsValue> {
    brew_ratios_json(brew_size_gallons).map_err(js_err)
}

/// Estimated ABV; negative when the final Brix is above the start
#[wasm_bindgen]
pub fn estimate_alcohol(start_brix: f64, end_brix: f64) -> Result<f64, JsValue> {
    alcohol(start_brix, end_brix).map_err(js_err)
}

/// Force-carbonation pressure in PSI
#[wasm_bindgen]
pub fn force_carbonation_psi(temp_f: f64, target_co2_volumes: f64) -> Result<f64, JsValue> {
    carb_psi(temp_f, target_co2_volumes).map_err(js_err)
}

/// Hours to carbonate at a given pressure
#[wasm_bindgen]
pub fn carbonation_time_hours(psi: f64) -> Result<f64, JsValue> {
    carb_hours(psi).map_err(js_err)
}

/// Progress, status and safety flag for an edited batch, as JSON
#[wasm_bindgen]
pub fn preview_batch_state(batch_json: &str) -> Result<String, JsValue> {
    batch_state_json(batch_json).map_err(js_err)
}

/// Active reminders for a batch at `now_ms` (Unix milliseconds), as JSON
#[wasm_bindgen]
pub fn active_reminders_at(batch_json: &str, now_ms: f64) -> Result<String, JsValue> {
    reminders_json(batch_json, now_ms).map_err(js_err)
}

/// Active reminders for a batch at the browser's current time
#[wasm_bindgen]
pub fn active_reminders_now(batch_json: &str) -> Result<String, JsValue> {
    active_reminders_at(batch_json, js_sys::Date::now())
}

//! Batch models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::note::{Note, RawNote};

/// One fermentation run
///
/// `progress_percentage`, `status`, `alcohol_estimate`, `force_carb_psi` and
/// `carb_time_estimate_hours` are a cache owned by
/// [`crate::status::refresh_derived`]. Writing them from anywhere else is a
/// bug; they are recomputed after every field change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    pub id: Uuid,
    pub name: String,

    // Brew parameters, fixed at creation
    pub start_date: NaiveDate,
    pub brew_size_gallons: Decimal,
    pub tea_type: String,
    pub sugar_type: String,

    // Primary fermentation
    pub start_ph: Option<Decimal>,
    pub start_brix: Option<Decimal>,
    pub end_ph: Option<Decimal>,
    pub end_brix: Option<Decimal>,
    pub taste_profile: Option<String>,
    pub primary_complete: bool,

    // Secondary fermentation and packaging
    pub secondary_start_date: Option<NaiveDate>,
    pub flavoring_method: Option<String>,
    pub filtering_method: Option<String>,
    pub carbonation_status: Option<CarbonationStatus>,
    pub target_co2_volumes: Option<Decimal>,
    pub carbonation_temp_f: Option<Decimal>,
    pub packaging_date: Option<NaiveDate>,
    pub ready_to_bottle: bool,
    pub pasteurized: bool,

    // Final readings
    pub final_ph: Option<Decimal>,
    pub final_brix: Option<Decimal>,
    pub final_taste_notes: Option<Note>,
    pub notes: Option<String>,

    // Derived cache
    pub progress_percentage: i32,
    pub status: BatchStatus,
    pub alcohol_estimate: Option<Decimal>,
    pub force_carb_psi: Option<Decimal>,
    pub carb_time_estimate_hours: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived brew status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStatus {
    #[default]
    NeedsAttention,
    InProgress,
    Ready,
    Complete,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::NeedsAttention => "needs-attention",
            BatchStatus::InProgress => "in-progress",
            BatchStatus::Ready => "ready",
            BatchStatus::Complete => "complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "needs-attention" => Some(BatchStatus::NeedsAttention),
            "in-progress" => Some(BatchStatus::InProgress),
            "ready" => Some(BatchStatus::Ready),
            "complete" => Some(BatchStatus::Complete),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Carbonation progress during secondary fermentation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CarbonationStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Complete,
}

impl CarbonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarbonationStatus::NotStarted => "Not Started",
            CarbonationStatus::InProgress => "In Progress",
            CarbonationStatus::Complete => "Complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Not Started" => Some(CarbonationStatus::NotStarted),
            "In Progress" => Some(CarbonationStatus::InProgress),
            "Complete" => Some(CarbonationStatus::Complete),
            _ => None,
        }
    }
}

/// Taste tags offered at the end of primary fermentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasteProfile {
    SweetMild,
    TangyDry,
    SourBalanced,
    VinegarySharp,
}

impl TasteProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            TasteProfile::SweetMild => "Sweet+Mild",
            TasteProfile::TangyDry => "Tangy+Dry",
            TasteProfile::SourBalanced => "Sour+Balanced",
            TasteProfile::VinegarySharp => "Vinegary+Sharp",
        }
    }

    /// Exact match against the closed tag set
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Sweet+Mild" => Some(TasteProfile::SweetMild),
            "Tangy+Dry" => Some(TasteProfile::TangyDry),
            "Sour+Balanced" => Some(TasteProfile::SourBalanced),
            "Vinegary+Sharp" => Some(TasteProfile::VinegarySharp),
            _ => None,
        }
    }

    /// Tags that indicate the sugar has been consumed
    pub fn signals_primary_complete(&self) -> bool {
        matches!(self, TasteProfile::TangyDry | TasteProfile::SourBalanced)
    }
}

/// Input for creating a batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBatch {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub start_date: NaiveDate,
    pub brew_size_gallons: Decimal,
    #[validate(length(min = 1, max = 100))]
    pub tea_type: String,
    #[validate(length(min = 1, max = 100))]
    pub sugar_type: String,
    pub start_ph: Option<Decimal>,
    pub start_brix: Option<Decimal>,
    pub notes: Option<String>,
}

/// Field-by-field mutation of a batch
///
/// An absent key leaves the field untouched, `null` clears it. Derived
/// fields are deliberately missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_ph: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_brix: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_ph: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_brix: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub taste_profile: Option<Option<String>>,
    pub primary_complete: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub secondary_start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub flavoring_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub filtering_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub carbonation_status: Option<Option<CarbonationStatus>>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_co2_volumes: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub carbonation_temp_f: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub packaging_date: Option<Option<NaiveDate>>,
    pub ready_to_bottle: Option<bool>,
    pub pasteurized: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub final_ph: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub final_brix: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub final_taste_notes: Option<Option<RawNote>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Batch {
    /// Create a batch with creation defaults and a freshly derived state
    pub fn new(input: NewBatch, now: DateTime<Utc>) -> Self {
        let mut batch = Batch {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            start_date: input.start_date,
            brew_size_gallons: input.brew_size_gallons,
            tea_type: input.tea_type,
            sugar_type: input.sugar_type,
            start_ph: input.start_ph,
            start_brix: input.start_brix,
            end_ph: None,
            end_brix: None,
            taste_profile: None,
            primary_complete: false,
            secondary_start_date: None,
            flavoring_method: None,
            filtering_method: None,
            carbonation_status: None,
            target_co2_volumes: None,
            carbonation_temp_f: None,
            packaging_date: None,
            ready_to_bottle: false,
            pasteurized: false,
            final_ph: None,
            final_brix: None,
            final_taste_notes: None,
            notes: input.notes,
            progress_percentage: 0,
            status: BatchStatus::NeedsAttention,
            alcohol_estimate: None,
            force_carb_psi: None,
            carb_time_estimate_hours: None,
            created_at: now,
            updated_at: now,
        };
        crate::status::refresh_derived(&mut batch);
        batch
    }

    /// Apply an update and recompute the derived cache
    pub fn apply_update(&mut self, update: BatchUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        set(&mut self.start_ph, update.start_ph);
        set(&mut self.start_brix, update.start_brix);
        set(&mut self.end_ph, update.end_ph);
        set(&mut self.end_brix, update.end_brix);
        set(
            &mut self.taste_profile,
            update
                .taste_profile
                .map(|tag| tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())),
        );
        if let Some(flag) = update.primary_complete {
            self.primary_complete = flag;
        }
        set(&mut self.secondary_start_date, update.secondary_start_date);
        set(&mut self.flavoring_method, update.flavoring_method);
        set(&mut self.filtering_method, update.filtering_method);
        set(&mut self.carbonation_status, update.carbonation_status);
        set(&mut self.target_co2_volumes, update.target_co2_volumes);
        set(&mut self.carbonation_temp_f, update.carbonation_temp_f);
        set(&mut self.packaging_date, update.packaging_date);
        if let Some(flag) = update.ready_to_bottle {
            self.ready_to_bottle = flag;
        }
        if let Some(flag) = update.pasteurized {
            self.pasteurized = flag;
        }
        set(&mut self.final_ph, update.final_ph);
        set(&mut self.final_brix, update.final_brix);
        if let Some(raw) = update.final_taste_notes {
            self.final_taste_notes = Note::from_raw(raw);
        }
        set(&mut self.notes, update.notes);

        self.updated_at = now;
        crate::status::refresh_derived(self);
    }
}

fn set<T>(field: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Whether an optional text field holds something other than whitespace
pub fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

//! Measurement snapshot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::Analysis;
use super::note::{Note, RawNote};

/// One point-in-time reading for a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interval {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub ph: Option<Decimal>,
    pub brix: Option<Decimal>,
    pub temperature_f: Option<Decimal>,
    pub taste_notes: Option<Note>,
    pub visual_notes: Option<Note>,
    pub aroma_notes: Option<Note>,
    /// Attached once an analysis arrives
    pub ai_insight: Option<String>,
    pub health_score: Option<i32>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct NewInterval {
    /// Defaults to the creation time
    pub recorded_at: Option<DateTime<Utc>>,
    pub ph: Option<Decimal>,
    pub brix: Option<Decimal>,
    pub temperature_f: Option<Decimal>,
    pub taste_notes: Option<RawNote>,
    pub visual_notes: Option<RawNote>,
    pub aroma_notes: Option<RawNote>,
}

impl Interval {
    pub fn new(batch_id: Uuid, input: NewInterval, now: DateTime<Utc>) -> Self {
        Interval {
            id: Uuid::new_v4(),
            batch_id,
            recorded_at: input.recorded_at.unwrap_or(now),
            ph: input.ph,
            brix: input.brix,
            temperature_f: input.temperature_f,
            taste_notes: Note::from_raw(input.taste_notes),
            visual_notes: Note::from_raw(input.visual_notes),
            aroma_notes: Note::from_raw(input.aroma_notes),
            ai_insight: None,
            health_score: None,
            recommendations: Vec::new(),
            created_at: now,
        }
    }

    pub fn has_analysis(&self) -> bool {
        self.health_score.is_some() || self.ai_insight.is_some()
    }

    /// Copy an analysis onto the snapshot. Analyses of other batches are ignored.
    pub fn attach_analysis(&mut self, analysis: &Analysis) -> bool {
        if analysis.batch_id != self.batch_id {
            return false;
        }
        self.ai_insight = Some(analysis.insight.clone());
        self.health_score = Some(analysis.health_score);
        self.recommendations = analysis.recommendations.clone();
        true
    }

    /// Whether any reading was captured at all
    pub fn has_readings(&self) -> bool {
        self.ph.is_some()
            || self.brix.is_some()
            || self.temperature_f.is_some()
            || self.taste_notes.is_some()
            || self.visual_notes.is_some()
            || self.aroma_notes.is_some()
    }
}

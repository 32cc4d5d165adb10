//! Follow-up reminder models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A derived follow-up task. Regenerated on every evaluation, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    /// `{batch_id}-{kind}`
    pub id: String,
    pub batch_id: Uuid,
    pub message: String,
    pub trigger_date: NaiveDate,
    pub completed: bool,
    pub kind: ReminderKind,
}

/// Reminder kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderKind {
    PhBrix,
    BottlingCheck,
    FinalMeasurements,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::PhBrix => "ph-brix",
            ReminderKind::BottlingCheck => "bottling-check",
            ReminderKind::FinalMeasurements => "final-measurements",
        }
    }
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Reminder {
    pub fn reminder_id(batch_id: Uuid, kind: ReminderKind) -> String {
        format!("{}-{}", batch_id, kind.as_str())
    }
}

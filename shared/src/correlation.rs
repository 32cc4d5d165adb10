//! Analysis correlation
//!
//! Snapshots and analyses are written independently: the snapshot first,
//! the analysis whenever the text-generation call returns. They are joined
//! here by time. An analysis whose `analyzed_at` falls within
//! [`CORRELATION_WINDOW_SECS`] of the snapshot's creation is a time-window
//! match; the closest one wins. Without one, any analysis of the same batch
//! is used as a fallback and the match is labelled as such.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Analysis, Interval};

/// Tolerance between snapshot creation and analysis completion
pub const CORRELATION_WINDOW_SECS: i64 = 60;

/// How an analysis was associated with a snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Analysis fields were already stored on the snapshot
    Attached,
    /// Matched within the tolerance window
    TimeWindow,
    /// Any analysis of the batch, no timestamp match
    Fallback,
}

/// Result of correlating one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisMatch<'a> {
    pub analysis: &'a Analysis,
    pub confidence: MatchConfidence,
    /// `analyzed_at - created_at` in milliseconds
    pub offset_ms: i64,
}

/// Find the most relevant analysis for a snapshot
pub fn correlate<'a>(snapshot: &Interval, analyses: &'a [Analysis]) -> Option<AnalysisMatch<'a>> {
    let window_ms = CORRELATION_WINDOW_SECS * 1000;
    let mut best: Option<AnalysisMatch<'a>> = None;
    let mut latest: Option<&'a Analysis> = None;

    for analysis in analyses.iter().filter(|a| a.batch_id == snapshot.batch_id) {
        let offset_ms = (analysis.analyzed_at - snapshot.created_at).num_milliseconds();
        if offset_ms.abs() <= window_ms {
            let closer = best
                .map(|b| offset_ms.abs() < b.offset_ms.abs())
                .unwrap_or(true);
            if closer {
                best = Some(AnalysisMatch {
                    analysis,
                    confidence: MatchConfidence::TimeWindow,
                    offset_ms,
                });
            }
        }
        if latest.map(|l| analysis.analyzed_at > l.analyzed_at).unwrap_or(true) {
            latest = Some(analysis);
        }
    }

    best.or_else(|| {
        latest.map(|analysis| AnalysisMatch {
            analysis,
            confidence: MatchConfidence::Fallback,
            offset_ms: (analysis.analyzed_at - snapshot.created_at).num_milliseconds(),
        })
    })
}

/// A snapshot merged with its analysis for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelatedSnapshot {
    #[serde(flatten)]
    pub interval: Interval,
    pub analysis_id: Option<Uuid>,
    pub insight: Option<String>,
    pub display_health_score: Option<i32>,
    pub display_recommendations: Vec<String>,
    pub alerts: Vec<String>,
    pub match_confidence: Option<MatchConfidence>,
}

/// Merge the best analysis onto a snapshot. Stored analysis fields win.
pub fn attach(snapshot: &Interval, analyses: &[Analysis]) -> CorrelatedSnapshot {
    if snapshot.has_analysis() {
        // The stored fields stay authoritative; the source record only adds id and alerts
        let source = analyses
            .iter()
            .find(|a| a.batch_id == snapshot.batch_id && a.interval_id == Some(snapshot.id));
        return CorrelatedSnapshot {
            interval: snapshot.clone(),
            analysis_id: source.map(|a| a.id),
            insight: snapshot.ai_insight.clone(),
            display_health_score: snapshot.health_score,
            display_recommendations: snapshot.recommendations.clone(),
            alerts: source.map(|a| a.alerts.clone()).unwrap_or_default(),
            match_confidence: Some(MatchConfidence::Attached),
        };
    }

    match correlate(snapshot, analyses) {
        Some(found) => CorrelatedSnapshot {
            interval: snapshot.clone(),
            analysis_id: Some(found.analysis.id),
            insight: Some(found.analysis.insight.clone()),
            display_health_score: Some(found.analysis.health_score),
            display_recommendations: found.analysis.recommendations.clone(),
            alerts: found.analysis.alerts.clone(),
            match_confidence: Some(found.confidence),
        },
        None => CorrelatedSnapshot {
            interval: snapshot.clone(),
            analysis_id: None,
            insight: None,
            display_health_score: None,
            display_recommendations: Vec::new(),
            alerts: Vec::new(),
            match_confidence: None,
        },
    }
}

/// Correlate every snapshot of a batch
pub fn attach_all(snapshots: &[Interval], analyses: &[Analysis]) -> Vec<CorrelatedSnapshot> {
    snapshots.iter().map(|s| attach(s, analyses)).collect()
}

/// Unweighted mean health score of a batch's analyses
pub fn average_health_score(batch_id: Uuid, analyses: &[Analysis]) -> Option<f64> {
    let scores: Vec<i32> = analyses
        .iter()
        .filter(|a| a.batch_id == batch_id)
        .map(|a| a.health_score)
        .collect();

    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64)
    }
}

/// One point on a health trend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthPoint {
    pub interval_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub health_score: i32,
    pub match_confidence: Option<MatchConfidence>,
}

/// Health scores in recorded order. No smoothing.
pub fn health_trend(snapshots: &[CorrelatedSnapshot]) -> Vec<HealthPoint> {
    let mut sorted: Vec<&CorrelatedSnapshot> = snapshots.iter().collect();
    sorted.sort_by_key(|s| s.interval.recorded_at);

    sorted
        .into_iter()
        .filter_map(|s| {
            s.display_health_score.map(|score| HealthPoint {
                interval_id: s.interval.id,
                recorded_at: s.interval.recorded_at,
                health_score: score,
                match_confidence: s.match_confidence,
            })
        })
        .collect()
}

/// Batch-level health overview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthSummary {
    pub batch_id: Uuid,
    pub analysis_count: usize,
    pub average_health_score: Option<f64>,
    pub latest_health_score: Option<i32>,
    pub trend: Vec<HealthPoint>,
}

pub fn summarize(batch_id: Uuid, snapshots: &[Interval], analyses: &[Analysis]) -> HealthSummary {
    let correlated = attach_all(snapshots, analyses);
    let trend = health_trend(&correlated);

    HealthSummary {
        batch_id,
        analysis_count: analyses.iter().filter(|a| a.batch_id == batch_id).count(),
        average_health_score: average_health_score(batch_id, analyses),
        latest_health_score: trend.last().map(|p| p.health_score),
        trend,
    }
}

//! Analysis correlation tests for the kombucha batch tracker
//!
//! Time-window matching, fallback labelling and health summaries.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    attach, attach_all, average_health_score, correlate, summarize, Analysis, AnalysisPayload,
    Interval, MatchConfidence, NewInterval, CORRELATION_WINDOW_SECS,
};
use uuid::Uuid;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 10, 9, 0, 0).unwrap()
}

fn snapshot(batch_id: Uuid, created_at: DateTime<Utc>) -> Interval {
    Interval::new(
        batch_id,
        NewInterval {
            recorded_at: None,
            ph: Some(Decimal::new(36, 1)),
            brix: Some(Decimal::from(5)),
            temperature_f: None,
            taste_notes: None,
            visual_notes: None,
            aroma_notes: None,
        },
        created_at,
    )
}

fn analysis(batch_id: Uuid, score: f64, analyzed_at: DateTime<Utc>) -> Analysis {
    Analysis::from_payload(
        batch_id,
        None,
        AnalysisPayload {
            health_score: score,
            analysis: format!("Scored {}", score),
            recommendations: vec!["Keep at 75F".to_string()],
            alerts: Vec::new(),
        },
        serde_json::json!({}),
        analyzed_at,
    )
}

// ============================================================================
// Time-window matching
// ============================================================================

#[test]
fn test_closest_analysis_within_window_wins() {
    let batch_id = Uuid::new_v4();
    let snap = snapshot(batch_id, t0());
    let analyses = vec![
        analysis(batch_id, 90.0, t0() + Duration::seconds(500)),
        analysis(batch_id, 70.0, t0() + Duration::seconds(30)),
    ];

    let found = correlate(&snap, &analyses).unwrap();
    assert_eq!(found.analysis.id, analyses[1].id);
    assert_eq!(found.confidence, MatchConfidence::TimeWindow);
    assert_eq!(found.offset_ms, 30_000);
}

#[test]
fn test_window_boundary_is_inclusive() {
    let batch_id = Uuid::new_v4();
    let snap = snapshot(batch_id, t0());
    let analyses = vec![analysis(
        batch_id,
        80.0,
        t0() + Duration::seconds(CORRELATION_WINDOW_SECS),
    )];

    let found = correlate(&snap, &analyses).unwrap();
    assert_eq!(found.confidence, MatchConfidence::TimeWindow);
}

#[test]
fn test_analysis_before_snapshot_can_match() {
    let batch_id = Uuid::new_v4();
    let snap = snapshot(batch_id, t0());
    let analyses = vec![analysis(batch_id, 65.0, t0() - Duration::seconds(10))];

    let found = correlate(&snap, &analyses).unwrap();
    assert_eq!(found.confidence, MatchConfidence::TimeWindow);
    assert_eq!(found.offset_ms, -10_000);
}

#[test]
fn test_equal_distance_keeps_first() {
    let batch_id = Uuid::new_v4();
    let snap = snapshot(batch_id, t0());
    let analyses = vec![
        analysis(batch_id, 60.0, t0() - Duration::seconds(20)),
        analysis(batch_id, 61.0, t0() + Duration::seconds(20)),
    ];

    let found = correlate(&snap, &analyses).unwrap();
    assert_eq!(found.analysis.id, analyses[0].id);
}

// ============================================================================
// Fallback
// ============================================================================

#[test]
fn test_fallback_uses_latest_and_is_labelled() {
    let batch_id = Uuid::new_v4();
    let snap = snapshot(batch_id, t0());
    let analyses = vec![
        analysis(batch_id, 50.0, t0() + Duration::hours(2)),
        analysis(batch_id, 55.0, t0() + Duration::hours(5)),
        analysis(batch_id, 52.0, t0() - Duration::hours(3)),
    ];

    let found = correlate(&snap, &analyses).unwrap();
    assert_eq!(found.analysis.id, analyses[1].id);
    assert_eq!(found.confidence, MatchConfidence::Fallback);
}

#[test]
fn test_other_batches_are_ignored() {
    let snap = snapshot(Uuid::new_v4(), t0());
    let analyses = vec![analysis(Uuid::new_v4(), 88.0, t0())];

    assert!(correlate(&snap, &analyses).is_none());
    let merged = attach(&snap, &analyses);
    assert_eq!(merged.match_confidence, None);
    assert_eq!(merged.display_health_score, None);
}

// ============================================================================
// Attaching
// ============================================================================

#[test]
fn test_stored_fields_win_over_correlation() {
    let batch_id = Uuid::new_v4();
    let mut snap = snapshot(batch_id, t0());
    let stored = analysis(batch_id, 40.0, t0() + Duration::seconds(5));
    assert!(snap.attach_analysis(&stored));

    let closer = vec![analysis(batch_id, 95.0, t0())];
    let merged = attach(&snap, &closer);
    assert_eq!(merged.match_confidence, Some(MatchConfidence::Attached));
    assert_eq!(merged.display_health_score, Some(40));
}

#[test]
fn test_attached_snapshot_carries_source_id_and_alerts() {
    let batch_id = Uuid::new_v4();
    let mut snap = snapshot(batch_id, t0());
    let source = Analysis::from_payload(
        batch_id,
        Some(snap.id),
        AnalysisPayload {
            health_score: 35.0,
            analysis: "Fuzzy spots on the pellicle".to_string(),
            recommendations: vec!["Inspect for mold".to_string()],
            alerts: vec!["Possible mold".to_string()],
        },
        serde_json::json!({}),
        t0() + Duration::seconds(8),
    );
    assert!(snap.attach_analysis(&source));

    let unrelated = analysis(batch_id, 90.0, t0());
    let merged = attach(&snap, &[unrelated, source.clone()]);
    assert_eq!(merged.match_confidence, Some(MatchConfidence::Attached));
    assert_eq!(merged.analysis_id, Some(source.id));
    assert_eq!(merged.alerts, vec!["Possible mold".to_string()]);
    assert_eq!(merged.display_health_score, Some(35));

    // Source record not loaded: stored fields still shown, nothing invented
    let merged = attach(&snap, &[]);
    assert_eq!(merged.analysis_id, None);
    assert!(merged.alerts.is_empty());
    assert_eq!(merged.insight.as_deref(), Some("Fuzzy spots on the pellicle"));
}

#[test]
fn test_attach_all_keeps_order() {
    let batch_id = Uuid::new_v4();
    let snaps = vec![
        snapshot(batch_id, t0()),
        snapshot(batch_id, t0() + Duration::days(1)),
    ];
    let analyses = vec![analysis(batch_id, 72.0, t0() + Duration::seconds(15))];

    let merged = attach_all(&snaps, &analyses);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].match_confidence, Some(MatchConfidence::TimeWindow));
    assert_eq!(merged[1].match_confidence, Some(MatchConfidence::Fallback));
}

// ============================================================================
// Health summary
// ============================================================================

#[test]
fn test_average_health_score_is_unweighted() {
    let batch_id = Uuid::new_v4();
    let analyses = vec![
        analysis(batch_id, 60.0, t0()),
        analysis(batch_id, 90.0, t0() + Duration::hours(1)),
        analysis(Uuid::new_v4(), 10.0, t0()),
    ];
    assert_eq!(average_health_score(batch_id, &analyses), Some(75.0));
    assert_eq!(average_health_score(Uuid::new_v4(), &[]), None);
}

#[test]
fn test_summary_trend_in_recorded_order() {
    let batch_id = Uuid::new_v4();
    let later = snapshot(batch_id, t0() + Duration::days(2));
    let earlier = snapshot(batch_id, t0());
    let analyses = vec![
        analysis(batch_id, 70.0, t0() + Duration::seconds(20)),
        analysis(batch_id, 85.0, t0() + Duration::days(2) + Duration::seconds(20)),
    ];

    let summary = summarize(batch_id, &[later, earlier], &analyses);
    assert_eq!(summary.analysis_count, 2);
    assert_eq!(summary.average_health_score, Some(77.5));
    let scores: Vec<i32> = summary.trend.iter().map(|p| p.health_score).collect();
    assert_eq!(scores, vec![70, 85]);
    assert_eq!(summary.latest_health_score, Some(85));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Anything within the window is matched by time; anything beyond falls back
    #[test]
    fn window_decides_confidence(offset_secs in -600i64..600) {
        let batch_id = Uuid::new_v4();
        let snap = snapshot(batch_id, t0());
        let analyses = vec![analysis(batch_id, 50.0, t0() + Duration::seconds(offset_secs))];

        let found = correlate(&snap, &analyses).unwrap();
        let expected = if offset_secs.abs() <= CORRELATION_WINDOW_SECS {
            MatchConfidence::TimeWindow
        } else {
            MatchConfidence::Fallback
        };
        prop_assert_eq!(found.confidence, expected);
    }
}

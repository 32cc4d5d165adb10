//! AI analysis models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::validate_health_score;

/// One AI-generated assessment of a batch. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    pub id: Uuid,
    pub batch_id: Uuid,
    /// Snapshot that triggered the request, when known
    pub interval_id: Option<Uuid>,
    pub insight: String,
    pub recommendations: Vec<String>,
    pub alerts: Vec<String>,
    /// 0-100
    pub health_score: i32,
    /// The structured data that was sent for analysis
    pub analyzed_data: serde_json::Value,
    pub analyzed_at: DateTime<Utc>,
}

/// Payload expected back from the text-generation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub health_score: f64,
    pub analysis: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub alerts: Vec<String>,
}

/// Reasons a generated payload is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("Response contained no JSON object")]
    NoJsonObject,

    #[error("Malformed analysis payload: {0}")]
    Malformed(String),

    #[error("Health score {0} is outside 0-100")]
    HealthScoreOutOfRange(f64),

    #[error("Analysis text is empty")]
    EmptyAnalysis,
}

impl AnalysisPayload {
    /// Parse generated text into a payload.
    ///
    /// Models often wrap JSON in markdown fences or add a sentence before
    /// it, so only the outermost `{ ... }` span is parsed.
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let start = text.find('{').ok_or(PayloadError::NoJsonObject)?;
        let end = text.rfind('}').ok_or(PayloadError::NoJsonObject)?;
        if end < start {
            return Err(PayloadError::NoJsonObject);
        }

        let payload: AnalysisPayload = serde_json::from_str(&text[start..=end])
            .map_err(|e| PayloadError::Malformed(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> Result<(), PayloadError> {
        validate_health_score(self.health_score)
            .map_err(|_| PayloadError::HealthScoreOutOfRange(self.health_score))?;
        if self.analysis.trim().is_empty() {
            return Err(PayloadError::EmptyAnalysis);
        }
        Ok(())
    }

    /// Health score rounded to a whole number
    pub fn rounded_health_score(&self) -> i32 {
        self.health_score.round() as i32
    }
}

impl Analysis {
    /// Build an analysis record from a validated payload
    pub fn from_payload(
        batch_id: Uuid,
        interval_id: Option<Uuid>,
        payload: AnalysisPayload,
        analyzed_data: serde_json::Value,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        let health_score = payload.rounded_health_score();
        Analysis {
            id: Uuid::new_v4(),
            batch_id,
            interval_id,
            insight: payload.analysis.trim().to_string(),
            recommendations: clean_list(payload.recommendations),
            alerts: clean_list(payload.alerts),
            health_score,
            analyzed_data,
            analyzed_at,
        }
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let payload = AnalysisPayload::parse(
            r#"{"healthScore": 82, "analysis": "Healthy ferment", "recommendations": ["Taste in 2 days"]}"#,
        )
        .unwrap();
        assert_eq!(payload.rounded_health_score(), 82);
        assert_eq!(payload.recommendations.len(), 1);
        assert!(payload.alerts.is_empty());
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "Here is the analysis:\n```json\n{\"healthScore\": 74.6, \"analysis\": \"Slightly slow\", \"recommendations\": [], \"alerts\": [\"Cool room\"]}\n```";
        let payload = AnalysisPayload::parse(text).unwrap();
        assert_eq!(payload.rounded_health_score(), 75);
        assert_eq!(payload.alerts, vec!["Cool room".to_string()]);
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert_eq!(
            AnalysisPayload::parse("I could not analyze this batch."),
            Err(PayloadError::NoJsonObject)
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            AnalysisPayload::parse(r#"{"healthScore": "high", "analysis": "ok"}"#),
            Err(PayloadError::Malformed(_))
        ));
        assert!(matches!(
            AnalysisPayload::parse("} {"),
            Err(PayloadError::NoJsonObject)
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range_score() {
        assert_eq!(
            AnalysisPayload::parse(r#"{"healthScore": 140, "analysis": "ok"}"#),
            Err(PayloadError::HealthScoreOutOfRange(140.0))
        );
        // Checked before rounding
        assert_eq!(
            AnalysisPayload::parse(r#"{"healthScore": 100.4, "analysis": "ok"}"#),
            Err(PayloadError::HealthScoreOutOfRange(100.4))
        );
        assert_eq!(
            AnalysisPayload::parse(r#"{"healthScore": 50, "analysis": "  "}"#),
            Err(PayloadError::EmptyAnalysis)
        );
    }

    #[test]
    fn test_from_payload_drops_blank_recommendations() {
        let payload = AnalysisPayload {
            health_score: 90.0,
            analysis: " Good ".to_string(),
            recommendations: vec!["Bottle soon".to_string(), " ".to_string()],
            alerts: vec![],
        };
        let analysis = Analysis::from_payload(
            Uuid::new_v4(),
            None,
            payload,
            serde_json::json!({}),
            Utc::now(),
        );
        assert_eq!(analysis.insight, "Good");
        assert_eq!(analysis.recommendations, vec!["Bottle soon".to_string()]);
        assert_eq!(analysis.health_score, 90);
    }
}

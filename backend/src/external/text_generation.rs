//! Text generation client
//!
//! Client for an OpenAI-compatible chat-completions endpoint that produces
//! batch health analyses.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{Batch, Interval};

use crate::config::TextGenerationConfig;
use crate::error::{AppError, AppResult};

/// Snapshots included in a prompt, most recent last
pub const PROMPT_HISTORY_LIMIT: usize = 10;

const SYSTEM_PROMPT: &str = "You are a kombucha fermentation expert. Assess the health of the \
batch from its parameters and measurement history. Reply with a single JSON object: \
{\"healthScore\": number 0-100, \"analysis\": string, \"recommendations\": string[], \
\"alerts\": string[]}. Do not include any other text.";

/// Client for the text-generation service
#[derive(Clone)]
pub struct TextGenerationClient {
    api_endpoint: String,
    api_key: String,
    model: String,
    http_client: Client,
}

/// Prompt plus the structured data it was built from
#[derive(Debug, Clone)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl TextGenerationClient {
    /// Create a new text-generation client
    pub fn new(config: &TextGenerationConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            http_client,
        })
    }

    /// Create a client when the service is configured
    pub fn from_config(config: &TextGenerationConfig) -> AppResult<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }
        Self::new(config).map(Some)
    }

    /// Send a prompt and return the generated text
    pub async fn generate(&self, prompt: &AnalysisPrompt) -> AppResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.3,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::TextGeneration(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::TextGeneration(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::TextGeneration(format!("Failed to parse response: {}", e)))?;

        extract_content(result)
    }
}

fn extract_content(response: ChatResponse) -> AppResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AppError::TextGeneration("Response contained no content".to_string()))
}

/// Build the analysis prompt for a batch and its snapshot history
pub fn build_prompt(batch: &Batch, history: &[Interval]) -> AnalysisPrompt {
    let mut recent: Vec<&Interval> = history.iter().collect();
    recent.sort_by_key(|i| i.recorded_at);
    let skip = recent.len().saturating_sub(PROMPT_HISTORY_LIMIT);
    let recent: Vec<&Interval> = recent.into_iter().skip(skip).collect();

    let readings: Vec<serde_json::Value> = recent
        .iter()
        .map(|i| {
            serde_json::json!({
                "recordedAt": i.recorded_at.to_rfc3339(),
                "ph": i.ph,
                "brix": i.brix,
                "temperatureF": i.temperature_f,
                "taste": i.taste_notes.as_ref().map(|n| n.to_string()),
                "visual": i.visual_notes.as_ref().map(|n| n.to_string()),
                "aroma": i.aroma_notes.as_ref().map(|n| n.to_string()),
            })
        })
        .collect();

    let data = serde_json::json!({
        "batch": {
            "name": batch.name,
            "startDate": batch.start_date.to_string(),
            "brewSizeGallons": batch.brew_size_gallons,
            "teaType": batch.tea_type,
            "sugarType": batch.sugar_type,
            "startPh": batch.start_ph,
            "startBrix": batch.start_brix,
            "endPh": batch.end_ph,
            "endBrix": batch.end_brix,
            "tasteProfile": batch.taste_profile,
            "status": batch.status.as_str(),
            "progressPercentage": batch.progress_percentage,
        },
        "readings": readings,
    });

    let user = format!(
        "Analyze this kombucha batch and its measurement history:\n{}",
        serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string())
    );

    AnalysisPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use shared::{NewBatch, NewInterval};

    fn batch() -> Batch {
        Batch::new(
            NewBatch {
                name: "Black tea".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                brew_size_gallons: Decimal::from(1),
                tea_type: "Black".to_string(),
                sugar_type: "Cane".to_string(),
                start_ph: Some(Decimal::new(45, 1)),
                start_brix: Some(Decimal::from(8)),
                notes: None,
            },
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        )
    }

    fn reading(batch: &Batch, hours: i64) -> Interval {
        Interval::new(
            batch.id,
            NewInterval {
                recorded_at: None,
                ph: Some(Decimal::new(38, 1)),
                brix: Some(Decimal::from(6)),
                temperature_f: Some(Decimal::from(75)),
                taste_notes: None,
                visual_notes: None,
                aroma_notes: None,
            },
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + ChronoDuration::hours(hours),
        )
    }

    #[test]
    fn test_prompt_keeps_most_recent_readings() {
        let batch = batch();
        let history: Vec<Interval> = (0..15).rev().map(|h| reading(&batch, h)).collect();

        let prompt = build_prompt(&batch, &history);
        let readings = prompt.data["readings"].as_array().unwrap();

        assert_eq!(readings.len(), PROMPT_HISTORY_LIMIT);
        assert_eq!(
            readings.last().unwrap()["recordedAt"],
            history[0].recorded_at.to_rfc3339()
        );
        assert!(prompt.user.contains("Black tea"));
        assert!(prompt.system.contains("healthScore"));
    }

    #[test]
    fn test_extract_content_requires_text() {
        let empty = ChatResponse { choices: vec![] };
        assert!(matches!(
            extract_content(empty),
            Err(AppError::TextGeneration(_))
        ));

        let ok = ChatResponse {
            choices: vec![ChatChoice {
                message: ChatResponseMessage {
                    content: Some("{\"healthScore\": 80}".to_string()),
                },
            }],
        };
        assert_eq!(extract_content(ok).unwrap(), "{\"healthScore\": 80}");
    }

    #[test]
    fn test_disabled_config_yields_no_client() {
        let config = TextGenerationConfig {
            api_endpoint: String::new(),
            api_key: String::new(),
            model: "test".to_string(),
            timeout_secs: 5,
        };
        assert!(TextGenerationClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_unreachable_endpoint_is_text_generation_error() {
        let client = TextGenerationClient::new(&TextGenerationConfig {
            api_endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            api_key: "test-key".to_string(),
            model: "test".to_string(),
            timeout_secs: 2,
        })
        .unwrap();
        let prompt = build_prompt(&batch(), &[]);

        let result = tokio_test::block_on(client.generate(&prompt));
        assert!(matches!(result, Err(AppError::TextGeneration(_))));
    }
}

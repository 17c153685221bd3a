//! # Gemini Narrative Strategy
//!
//! [`NarrativeGenerator`] implementation backed by Google's Gemini API.
//! Sends a single `generateContent` request per prompt and extracts the first
//! candidate's text. Any transport, decoding, or quota problem surfaces as a
//! [`ReportError::NarrativeError`], which the feedback stage treats as a
//! routine signal to fall back to templated text.
//!
//! Requires `GEMINI_API_KEY` (and optionally `GEMINI_MODEL`) in the
//! environment; with no key configured the call fails fast without touching
//! the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::config;

use crate::error::ReportError;
use crate::traits::narrative::NarrativeGenerator;

/// Narrative strategy backed by the Gemini `generateContent` endpoint.
pub struct GeminiNarrative {
    client: reqwest::Client,
}

impl GeminiNarrative {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for GeminiNarrative {
    fn default() -> Self {
        Self::new()
    }
}

/// Request body for the Gemini API.
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

/// Response from the Gemini API.
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl NarrativeGenerator for GeminiNarrative {
    async fn generate(&self, prompt: &str) -> Result<String, ReportError> {
        let api_key = config::gemini_api_key();
        if api_key.is_empty() {
            return Err(ReportError::NarrativeError(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        let request_body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            config::gemini_model(),
            api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ReportError::NarrativeError(e.to_string()))?;

        let response_text = response
            .text()
            .await
            .map_err(|e| ReportError::NarrativeError(e.to_string()))?;

        let parsed = serde_json::from_str::<GeminiResponse>(&response_text).map_err(|e| {
            ReportError::NarrativeError(format!("error decoding response body: {e}"))
        })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ReportError::NarrativeError(
                "service returned an empty response".to_string(),
            ));
        }
        Ok(text)
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::prompts::PromptSpec;

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-09-2025:generateContent";

/// Client for the Gemini `generateContent` endpoint.
///
/// Holds the API key so it never reaches the frontend; the key travels as the
/// `key` query parameter, per the service's auth convention. Construct it once
/// at startup and share it through `AppState`.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl GeminiService {
    /// Build from the environment. `GEMINI_API_KEY` is required (an empty
    /// value counts as unset); `GEMINI_API_URL` optionally overrides the
    /// production endpoint, which the tests use to point at a local mock.
    pub fn from_env() -> Option<Self> {
        let api_key = dotenvy::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())?;
        let api_url =
            dotenvy::var("GEMINI_API_URL").unwrap_or_else(|_| GEMINI_API_URL.to_string());
        Some(Self::new(api_key, api_url))
    }

    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    /// One shot: send the prompt with its response schema, pull the first
    /// candidate's text out and parse it as JSON. No retry, no timeout beyond
    /// whatever the platform enforces.
    pub async fn generate(&self, spec: &PromptSpec) -> Result<Value, ApiError> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: spec.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: spec.schema.clone(),
                temperature: 0.5,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "Gemini API error");
            return Err(ApiError::Downstream(status));
        }

        let result: GenerateContentResponse = response.json().await?;
        let text = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::EmptyCandidate)?;

        serde_json::from_str(&text).map_err(ApiError::BadCandidateJson)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

// Response side is lenient on purpose: a 2xx with missing nesting should
// surface as the empty-candidate error, not as a deserialization failure.
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

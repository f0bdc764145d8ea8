//! Gemini `generateContent` client.
//!
//! Both the key probe and chat turns are plain (non-streaming) POSTs to
//! `{api_base}/models/{model}:generateContent?key=...`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{GeminiApi, GeminiConfig, GeminiError, GeminiResult};

/// Prompt sent by the key probe.
pub const PROBE_PROMPT: &str = "Hello";

/// Safety threshold applied to every category on chat turns.
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Endpoint URL for `model`, without the key parameter.
    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            model
        )
    }

    async fn post(
        &self,
        model: &str,
        api_key: &str,
        body: &GenerateContentRequest<'_>,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = self.endpoint(model);
        tracing::debug!(%url, "POST generateContent");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body).unwrap_or_else(|| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    body
                }
            });
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| GeminiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GeminiApi for GeminiClient {
    async fn probe(&self, api_key: &str) -> GeminiResult<()> {
        let body = GenerateContentRequest::probe();
        self.post(&self.config.probe_model, api_key, &body).await?;
        Ok(())
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> GeminiResult<Option<String>> {
        let body = GenerateContentRequest::chat(prompt, &self.config);
        let response = self.post(&self.config.chat_model, api_key, &body).await?;
        Ok(response.first_text())
    }
}

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub(crate) enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: HarmCategory,
    threshold: &'static str,
}

impl<'a> GenerateContentRequest<'a> {
    fn single_part(text: &'a str) -> Vec<Content<'a>> {
        vec![Content {
            parts: vec![Part { text }],
        }]
    }

    /// Minimal body used to check that a key is accepted.
    pub(crate) fn probe() -> Self {
        Self {
            contents: Self::single_part(PROBE_PROMPT),
            generation_config: None,
            safety_settings: Vec::new(),
        }
    }

    /// Full single-turn body for a chat message.
    pub(crate) fn chat(prompt: &'a str, config: &GeminiConfig) -> Self {
        Self {
            contents: Self::single_part(prompt),
            generation_config: Some(GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                top_p: config.top_p,
                top_k: config.top_k,
            }),
            safety_settings: HarmCategory::ALL
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }
}

/// Response body for `generateContent`. Only the fields we read are modelled.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate. Empty text counts as none.
    pub(crate) fn first_text(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .clone()
            .filter(|text| !text.is_empty())
    }
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Pull `error.message` out of an error body, if it has one.
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()?
        .error
        .message
        .filter(|m| !m.is_empty())
}

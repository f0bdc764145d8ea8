//! The `GeminiApi` trait the chat and setup flows talk to.
//!
//! The production implementation is [`super::GeminiClient`]; tests swap in
//! scripted fakes so the flows can be driven without a network.

use async_trait::async_trait;
use thiserror::Error;

/// Calls the flows make against the generation service.
///
/// # Example
///
/// ```ignore
/// use gemini_panel::llm::GeminiApi;
///
/// async fn ask(api: &dyn GeminiApi, key: &str) {
///     api.probe(key).await?;
///     let reply = api.generate(key, "2+2?").await?;
/// }
/// ```
#[async_trait]
pub trait GeminiApi: Send + Sync {
    /// Send the minimal validation request for `api_key`.
    ///
    /// Any non-2xx answer means the key was rejected.
    async fn probe(&self, api_key: &str) -> GeminiResult<()>;

    /// Send `prompt` as a single-turn generation request.
    ///
    /// Returns the first candidate's first text part, or `None` when the
    /// response carries no text.
    async fn generate(&self, api_key: &str, prompt: &str) -> GeminiResult<Option<String>>;
}

/// Result type for Gemini calls.
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Errors that can occur while talking to the Gemini API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeminiError {
    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl GeminiError {
    /// HTTP status of the failure, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network("Request timed out".to_string())
        } else if err.is_connect() {
            Self::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

//! Gemini API access.
//!
//! [`GeminiApi`] is the seam the flows depend on; [`GeminiClient`] is the
//! reqwest-backed implementation used by the binary.

mod gemini;
mod provider;

pub use gemini::{GeminiClient, PROBE_PROMPT};
pub use provider::{GeminiApi, GeminiError, GeminiResult};

use crate::config::GeminiConfigFile;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model answering chat turns.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

/// Model used to check a candidate key.
pub const DEFAULT_PROBE_MODEL: &str = "gemini-2.0-flash-exp";

/// Where users can create a key.
pub const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";

/// Runtime configuration for [`GeminiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_base: String,
    pub chat_model: String,
    pub probe_model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            probe_model: DEFAULT_PROBE_MODEL.to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
            top_p: 0.8,
            top_k: 40,
        }
    }
}

impl GeminiConfig {
    /// Build from the config file, letting `GEMINI_API_BASE` and
    /// `GEMINI_MODEL` override it.
    ///
    /// The API key is never taken from the environment: it only comes from
    /// the credential store.
    pub fn from_env_and_config(file_config: Option<&GeminiConfigFile>) -> Self {
        let mut config = Self::default();

        if let Some(fc) = file_config {
            config.api_base = fc.api_base.clone();
            config.chat_model = fc.chat_model.clone();
            config.probe_model = fc.probe_model.clone();
            config.temperature = fc.temperature;
            config.max_output_tokens = fc.max_output_tokens;
            config.top_p = fc.top_p;
            config.top_k = fc.top_k;
        }

        if let Ok(base) = std::env::var("GEMINI_API_BASE") {
            if !base.is_empty() {
                config.api_base = base;
            }
        }

        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.is_empty() {
                config.chat_model = model;
            }
        }

        config
    }
}

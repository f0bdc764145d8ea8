//! User-facing error taxonomy.
//!
//! Each flow catches lower-level failures where it issued the operation and
//! turns them into one of these. The `Display` text is what the panel shows;
//! the wrapped detail only goes to the log.

use thiserror::Error;

use crate::auth::StoreError;
use crate::llm::GeminiError;

/// Shown when the key probe is rejected or cannot be sent.
pub const INVALID_KEY_MESSAGE: &str = "Provide valid API key";

/// Shown when a chat turn fails.
pub const SEND_FAILED_MESSAGE: &str = "Failed to send message. Please try again.";

/// Shown by the chat view when no key is stored.
pub const MISSING_KEY_MESSAGE: &str = "No API key found. Please set your API key first.";

#[derive(Debug, Error)]
pub enum PanelError {
    /// The candidate key was rejected, or the probe never got an answer.
    #[error("Provide valid API key")]
    Validation(#[source] GeminiError),

    /// The credential store could not be written or cleared.
    #[error("Failed to save API key: {0}")]
    Persistence(#[source] StoreError),

    /// A chat turn failed.
    #[error("Failed to send message. Please try again.")]
    Generation(#[source] GeminiError),

    /// Chat was opened with no stored key.
    #[error("No API key found. Please set your API key first.")]
    MissingCredential,
}

impl PanelError {
    /// Inline message for the panel.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Upstream detail for logging, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Validation(e) | Self::Generation(e) => Some(e.to_string()),
            Self::Persistence(e) => Some(e.to_string()),
            Self::MissingCredential => None,
        }
    }
}

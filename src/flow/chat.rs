//! Chat screen state: transcript, draft and the single in-flight turn.

use std::sync::Arc;

use tokio::sync::oneshot;

use super::TextField;
use crate::auth::{load_credential, KeyValueStore, CREDENTIAL_KEY};
use crate::error::PanelError;
use crate::llm::{GeminiApi, GeminiError, GeminiResult};
use crate::message::{Message, Role};

/// Assistant message every chat starts with.
pub const GREETING: &str =
    "Hello! I'm your AI chat assistant powered by Gemini 2.5 Flash. How can I help you today?";

/// Reply recorded when the API answers without any text.
pub const NO_RESPONSE_FALLBACK: &str = "No response received";

/// Whether a turn is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingResponse,
}

/// Signals sent up to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEvent {
    /// The stored key was cleared; go back to setup.
    SignedOut,
}

pub struct ChatFlow {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn GeminiApi>,
    transcript: Vec<Message>,
    draft: TextField,
    turn_state: TurnState,
    credential: String,
    error_message: Option<String>,
    pending: Option<oneshot::Receiver<GeminiResult<Option<String>>>>,
}

impl ChatFlow {
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<dyn GeminiApi>) -> Self {
        Self {
            store,
            api,
            transcript: Vec::new(),
            draft: TextField::new(),
            turn_state: TurnState::Idle,
            credential: String::new(),
            error_message: None,
            pending: None,
        }
    }

    /// Load the stored key and seed the transcript with the greeting.
    pub fn mount(&mut self) {
        match load_credential(self.store.as_ref()) {
            Ok(Some(key)) => self.credential = key,
            Ok(None) => {
                tracing::warn!("Chat opened without a stored API key");
                self.error_message = Some(PanelError::MissingCredential.user_message());
            }
            Err(e) => {
                tracing::error!("Failed to read stored API key: {}", e);
                self.error_message = Some(PanelError::MissingCredential.user_message());
            }
        }

        self.transcript = vec![Message::assistant(GREETING)];
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn draft(&self) -> &TextField {
        &self.draft
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    pub fn is_awaiting(&self) -> bool {
        self.turn_state == TurnState::AwaitingResponse
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.is_empty()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether the draft accepts edits.
    pub fn input_enabled(&self) -> bool {
        !self.is_awaiting() && self.has_credential()
    }

    /// Whether Send is enabled.
    pub fn can_send(&self) -> bool {
        self.input_enabled() && !self.draft.is_blank()
    }

    // ── editing ───────────────────────────────────────────────────────────

    pub fn insert_char(&mut self, c: char) {
        if self.input_enabled() {
            self.draft.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.input_enabled() {
            self.draft.backspace();
        }
    }

    pub fn delete(&mut self) {
        if self.input_enabled() {
            self.draft.delete();
        }
    }

    pub fn move_left(&mut self) {
        self.draft.move_left();
    }

    pub fn move_right(&mut self) {
        self.draft.move_right();
    }

    pub fn move_home(&mut self) {
        self.draft.move_home();
    }

    pub fn move_end(&mut self) {
        self.draft.move_end();
    }

    // ── turn cycle ────────────────────────────────────────────────────────

    /// Send the draft as a new turn.
    ///
    /// The user message is appended straight away; it is taken back out if
    /// the request fails. Returns `false` without side effects when the draft
    /// is blank, a turn is already in flight, or no key is loaded.
    pub fn send(&mut self) -> bool {
        if !self.can_send() {
            return false;
        }

        let text = self.draft.as_str().trim().to_string();
        self.transcript.push(Message::user(text.clone()));
        self.draft.clear();
        self.error_message = None;
        self.turn_state = TurnState::AwaitingResponse;

        let (tx, rx) = oneshot::channel();
        let api = Arc::clone(&self.api);
        let key = self.credential.clone();
        tokio::spawn(async move {
            let result = api.generate(&key, &text).await;
            let _ = tx.send(result);
        });

        tracing::debug!(len = self.transcript.len(), "Turn sent");
        self.pending = Some(rx);
        true
    }

    /// Apply a finished turn, if any. Non-blocking; call every frame.
    ///
    /// Returns true if a turn completed (success or failure).
    pub fn poll_turn(&mut self) -> bool {
        let Some(mut rx) = self.pending.take() else {
            return false;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.apply_turn(result);
                true
            }
            Err(oneshot::error::TryRecvError::Empty) => {
                self.pending = Some(rx);
                false
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                self.apply_turn(Err(GeminiError::Network("Request task failed".to_string())));
                true
            }
        }
    }

    /// Wait for the in-flight turn and apply it.
    pub async fn finish_turn(&mut self) {
        let Some(rx) = self.pending.take() else {
            return;
        };
        let result = rx
            .await
            .unwrap_or_else(|_| Err(GeminiError::Network("Request task failed".to_string())));
        self.apply_turn(result);
    }

    fn apply_turn(&mut self, result: GeminiResult<Option<String>>) {
        match result {
            Ok(text) => {
                let text = text.unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string());
                self.transcript.push(Message::assistant(text));
            }
            Err(e) => {
                let err = PanelError::Generation(e);
                tracing::error!(
                    "Error sending message: {}",
                    err.detail().unwrap_or_default()
                );
                self.error_message = Some(err.user_message());
                if let Some(removed) = self.transcript.pop() {
                    debug_assert_eq!(removed.role, Role::User);
                }
            }
        }

        self.turn_state = TurnState::Idle;
    }

    /// Forget the stored key. Always signs out, even if the delete fails.
    pub fn sign_out(&mut self) -> ChatEvent {
        match self.store.delete(CREDENTIAL_KEY) {
            Ok(()) => tracing::info!("Signed out, API key removed"),
            Err(e) => tracing::error!("Failed to remove API key on sign out: {}", e),
        }
        ChatEvent::SignedOut
    }
}

//! API key setup screen state.
//!
//! A candidate key is only persisted after the probe request succeeds. The
//! screen then shows "Saved" for a short while before reporting
//! [`SetupEvent::Completed`] to the gate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use super::TextField;
use crate::auth::{load_credential, KeyValueStore, CREDENTIAL_KEY};
use crate::error::PanelError;
use crate::llm::{GeminiApi, GeminiError, GeminiResult};

/// Signals sent up to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupEvent {
    /// A key is stored and the chat screen should open.
    Completed,
}

/// What the Save control currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    Idle,
    Validating,
    Saved,
}

impl SetupStatus {
    pub fn button_label(&self) -> &'static str {
        match self {
            SetupStatus::Idle => "Save",
            SetupStatus::Validating => "Validating...",
            SetupStatus::Saved => "Saved",
        }
    }

    pub fn footer(&self) -> &'static str {
        match self {
            SetupStatus::Saved => "API key validated and stored successfully",
            _ => "Stored in local storage (this machine only)",
        }
    }
}

/// In-flight probe: the receiver plus the key it is checking.
struct PendingProbe {
    rx: oneshot::Receiver<GeminiResult<()>>,
    candidate: String,
}

pub struct SetupFlow {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn GeminiApi>,
    candidate: TextField,
    visible: bool,
    saving: bool,
    saved_at: Option<Instant>,
    saved_display: Duration,
    error_message: Option<String>,
    pending: Option<PendingProbe>,
}

impl SetupFlow {
    /// Create the flow. `saved_display` is how long "Saved" shows before the
    /// flow completes.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn GeminiApi>,
        saved_display: Duration,
    ) -> Self {
        Self {
            store,
            api,
            candidate: TextField::new(),
            visible: false,
            saving: false,
            saved_at: None,
            saved_display,
            error_message: None,
            pending: None,
        }
    }

    /// Check for an already stored key.
    ///
    /// A stored key is taken as configured without probing it again.
    pub fn mount(&mut self) -> Option<SetupEvent> {
        match load_credential(self.store.as_ref()) {
            Ok(Some(key)) => {
                tracing::info!("API key already stored, skipping setup");
                self.candidate = TextField::with_text(key);
                Some(SetupEvent::Completed)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Failed to read stored API key: {}", e);
                None
            }
        }
    }

    pub fn candidate(&self) -> &TextField {
        &self.candidate
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_saved(&self) -> bool {
        self.saved_at.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn status(&self) -> SetupStatus {
        if self.saving {
            SetupStatus::Validating
        } else if self.is_saved() {
            SetupStatus::Saved
        } else {
            SetupStatus::Idle
        }
    }

    /// Whether the key field accepts edits.
    pub fn is_editable(&self) -> bool {
        !self.saving
    }

    /// Whether Save is enabled.
    pub fn can_submit(&self) -> bool {
        !self.candidate.is_blank() && !self.saving && !self.is_saved()
    }

    /// Whether a probe or the saved display is still running.
    pub fn has_pending_work(&self) -> bool {
        self.pending.is_some() || self.saved_at.is_some()
    }

    /// The candidate as it should be drawn: masked unless visible.
    pub fn display_candidate(&self) -> String {
        if self.visible {
            self.candidate.as_str().to_string()
        } else {
            "•".repeat(self.candidate.len_chars())
        }
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    /// Show a non-fatal message (e.g. the browser could not be opened).
    pub fn set_hint(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    // ── editing ───────────────────────────────────────────────────────────

    fn edited(&mut self, changed: bool) {
        if changed {
            self.error_message = None;
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if self.is_editable() {
            self.candidate.insert(c);
            self.edited(true);
        }
    }

    pub fn backspace(&mut self) {
        if self.is_editable() {
            let changed = self.candidate.backspace();
            self.edited(changed);
        }
    }

    pub fn delete(&mut self) {
        if self.is_editable() {
            let changed = self.candidate.delete();
            self.edited(changed);
        }
    }

    pub fn move_left(&mut self) {
        self.candidate.move_left();
    }

    pub fn move_right(&mut self) {
        self.candidate.move_right();
    }

    pub fn move_home(&mut self) {
        self.candidate.move_home();
    }

    pub fn move_end(&mut self) {
        self.candidate.move_end();
    }

    // ── submit / clear ────────────────────────────────────────────────────

    /// Validate the candidate with a probe request.
    ///
    /// Returns `false` without doing anything when the candidate is blank or
    /// a submit is already in progress.
    pub fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }

        let candidate = self.candidate.as_str().to_string();
        self.saving = true;
        self.saved_at = None;
        self.error_message = None;

        let (tx, rx) = oneshot::channel();
        let api = Arc::clone(&self.api);
        let key = candidate.clone();
        tokio::spawn(async move {
            let result = api.probe(&key).await;
            let _ = tx.send(result);
        });

        tracing::info!("Validating API key");
        self.pending = Some(PendingProbe { rx, candidate });
        true
    }

    /// Apply a finished probe, if any. Non-blocking; call every frame.
    ///
    /// Returns true if a probe completed (success or failure).
    pub fn poll_validation(&mut self) -> bool {
        let Some(mut pending) = self.pending.take() else {
            return false;
        };

        match pending.rx.try_recv() {
            Ok(result) => {
                self.apply_validation(&pending.candidate, result);
                true
            }
            Err(oneshot::error::TryRecvError::Empty) => {
                self.pending = Some(pending);
                false
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                let result = Err(GeminiError::Network("Validation task failed".to_string()));
                self.apply_validation(&pending.candidate, result);
                true
            }
        }
    }

    /// Wait for the in-flight probe and apply it.
    pub async fn finish_validation(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let result = pending
            .rx
            .await
            .unwrap_or_else(|_| Err(GeminiError::Network("Validation task failed".to_string())));
        self.apply_validation(&pending.candidate, result);
    }

    fn apply_validation(&mut self, candidate: &str, result: GeminiResult<()>) {
        self.saving = false;

        if let Err(e) = result {
            let err = PanelError::Validation(e);
            tracing::warn!(
                "API key validation failed: {}",
                err.detail().unwrap_or_default()
            );
            self.error_message = Some(err.user_message());
            return;
        }

        if let Err(e) = self.store.set(CREDENTIAL_KEY, candidate) {
            let err = PanelError::Persistence(e);
            tracing::error!("{}", err);
            self.error_message = Some(err.user_message());
            return;
        }

        tracing::info!("API key validated and stored");
        self.saved_at = Some(Instant::now());
    }

    /// Finish the "Saved" display once it has been shown long enough.
    pub fn tick(&mut self) -> Option<SetupEvent> {
        self.tick_at(Instant::now())
    }

    /// [`Self::tick`] against an explicit clock.
    pub fn tick_at(&mut self, now: Instant) -> Option<SetupEvent> {
        let saved_at = self.saved_at?;
        if now.saturating_duration_since(saved_at) < self.saved_display {
            return None;
        }
        self.saved_at = None;
        Some(SetupEvent::Completed)
    }

    /// Reset the form and forget any stored key. The screen stays on setup.
    ///
    /// Ignored while validating and while "Saved" is showing.
    pub fn clear(&mut self) {
        if self.saving || self.is_saved() {
            return;
        }

        self.candidate.clear();
        self.error_message = None;

        match self.store.delete(CREDENTIAL_KEY) {
            Ok(()) => tracing::info!("API key removed from storage"),
            Err(e) => tracing::error!("Failed to remove API key: {}", e),
        }
    }
}

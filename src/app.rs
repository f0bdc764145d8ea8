use std::sync::Arc;
use std::time::Duration;

use ratatui::widgets::ScrollbarState;

use crate::auth::{KeyValueStore, CREDENTIAL_KEY};
use crate::flow::{ChatEvent, ChatFlow, SetupEvent, SetupFlow};
use crate::llm::GeminiApi;

/// Which screen the stored key allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// No key stored: show setup.
    Unconfigured,
    /// A key is stored: show chat.
    Ready,
}

impl Gate {
    /// Derive the gate from what the store currently holds.
    ///
    /// A store that cannot be read counts as holding nothing.
    pub fn from_store(store: &dyn KeyValueStore) -> Self {
        match store.contains(CREDENTIAL_KEY) {
            Ok(true) => Gate::Ready,
            Ok(false) => Gate::Unconfigured,
            Err(e) => {
                tracing::error!("Failed to read credential store: {}", e);
                Gate::Unconfigured
            }
        }
    }
}

/// The screen currently mounted behind the gate.
pub enum Screen {
    Setup(SetupFlow),
    Chat(ChatFlow),
}

impl Screen {
    pub fn gate(&self) -> Gate {
        match self {
            Screen::Setup(_) => Gate::Unconfigured,
            Screen::Chat(_) => Gate::Ready,
        }
    }
}

/// Scroll-related state for the transcript, in rendered rows.
///
/// While `stick_to_bottom` is set the view follows the newest row. Scrolling
/// up releases it; scrolling back to the last row sets it again.
#[derive(Debug)]
pub struct ScrollState {
    /// First visible row
    pub offset: usize,
    /// Scrollbar state for ratatui
    pub scrollbar: ScrollbarState,
    stick_to_bottom: bool,
    max_offset: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            scrollbar: ScrollbarState::default(),
            stick_to_bottom: true,
            max_offset: 0,
        }
    }
}

impl ScrollState {
    /// Scroll up one row.
    pub fn scroll_up(&mut self) {
        self.offset = self.offset.saturating_sub(1);
        self.stick_to_bottom = self.offset >= self.max_offset;
    }

    /// Scroll down one row.
    pub fn scroll_down(&mut self) {
        self.offset = (self.offset + 1).min(self.max_offset);
        self.stick_to_bottom = self.offset >= self.max_offset;
    }

    /// Scroll up by page size.
    pub fn scroll_page_up(&mut self, page_size: usize) {
        self.offset = self.offset.saturating_sub(page_size);
        self.stick_to_bottom = self.offset >= self.max_offset;
    }

    /// Scroll down by page size.
    pub fn scroll_page_down(&mut self, page_size: usize) {
        self.offset = (self.offset + page_size).min(self.max_offset);
        self.stick_to_bottom = self.offset >= self.max_offset;
    }

    /// Scroll to top.
    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.stick_to_bottom = self.max_offset == 0;
    }

    /// Scroll to bottom and keep following new rows.
    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset;
        self.stick_to_bottom = true;
    }

    pub fn is_at_bottom(&self) -> bool {
        self.stick_to_bottom
    }

    pub fn max_offset(&self) -> usize {
        self.max_offset
    }

    /// Fit the offset to `total_rows` shown `visible_rows` at a time.
    ///
    /// Called on every draw, before the rows are sliced.
    pub fn update(&mut self, total_rows: usize, visible_rows: usize) {
        self.max_offset = total_rows.saturating_sub(visible_rows);
        if self.stick_to_bottom {
            self.offset = self.max_offset;
        } else {
            self.offset = self.offset.min(self.max_offset);
        }
        self.scrollbar = self
            .scrollbar
            .content_length(self.max_offset + 1)
            .viewport_content_length(visible_rows)
            .position(self.offset);
    }
}

/// Application state: the credential gate and its mounted screen.
pub struct App {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn GeminiApi>,
    saved_display: Duration,
    /// Mounted screen
    pub screen: Screen,
    /// Transcript scroll position
    pub scroll: ScrollState,
    /// Cursor blink visibility state
    pub cursor_visible: bool,
}

impl App {
    /// Read the store once and mount the matching screen.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn GeminiApi>,
        saved_display: Duration,
    ) -> Self {
        let gate = Gate::from_store(store.as_ref());
        tracing::info!(?gate, "Starting");

        let placeholder = SetupFlow::new(Arc::clone(&store), Arc::clone(&api), saved_display);
        let mut app = Self {
            store,
            api,
            saved_display,
            screen: Screen::Setup(placeholder),
            scroll: ScrollState::default(),
            cursor_visible: true,
        };

        match gate {
            Gate::Ready => app.show_chat(),
            Gate::Unconfigured => app.show_setup(),
        }
        app
    }

    pub fn gate(&self) -> Gate {
        self.screen.gate()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    fn show_setup(&mut self) {
        let mut setup = SetupFlow::new(
            Arc::clone(&self.store),
            Arc::clone(&self.api),
            self.saved_display,
        );
        let event = setup.mount();
        self.screen = Screen::Setup(setup);
        if let Some(event) = event {
            self.on_setup_event(event);
        }
    }

    fn show_chat(&mut self) {
        let mut chat = ChatFlow::new(Arc::clone(&self.store), Arc::clone(&self.api));
        chat.mount();
        self.screen = Screen::Chat(chat);
        self.scroll = ScrollState::default();
    }

    fn on_setup_event(&mut self, event: SetupEvent) {
        match event {
            SetupEvent::Completed => self.show_chat(),
        }
    }

    fn on_chat_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::SignedOut => self.show_setup(),
        }
    }

    /// Sign out from the chat screen.
    pub fn sign_out(&mut self) {
        if let Screen::Chat(chat) = &mut self.screen {
            let event = chat.sign_out();
            self.on_chat_event(event);
        }
    }

    /// Advance async work: finished requests and the saved-key delay.
    ///
    /// Call this once per frame.
    pub fn tick(&mut self) {
        let mut setup_event = None;
        match &mut self.screen {
            Screen::Setup(setup) => {
                setup.poll_validation();
                setup_event = setup.tick();
            }
            Screen::Chat(chat) => {
                chat.poll_turn();
            }
        }

        if let Some(event) = setup_event {
            self.on_setup_event(event);
        }
    }

    /// Whether something is in flight and the loop should poll quickly.
    pub fn has_pending_work(&self) -> bool {
        match &self.screen {
            Screen::Setup(setup) => setup.has_pending_work(),
            Screen::Chat(chat) => chat.is_awaiting(),
        }
    }

    /// Toggle cursor visibility for blinking effect.
    pub fn toggle_cursor(&mut self) {
        self.cursor_visible = !self.cursor_visible;
    }

}

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};

use crate::app::{App, Screen};
use crate::config::Config;
use crate::flow::{ChatFlow, SetupFlow};
use crate::llm::API_KEY_URL;
use crate::ui;

/// Result of handling a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
    /// Continue running the app
    Continue,
    /// Exit the app
    Exit,
}

/// Poll interval while a request or the saved-key delay is running.
const BUSY_POLL_MS: u64 = 16;

/// Run the main application loop.
///
/// Must be called from inside a tokio runtime context: the flows spawn their
/// requests onto it.
pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config: &Config,
) -> io::Result<()> {
    let behavior = &config.behavior;
    let mut last_cursor_toggle = Instant::now();

    loop {
        // Apply finished requests and timers before drawing
        app.tick();

        terminal.draw(|f| ui::ui(f, app, config))?;

        if last_cursor_toggle.elapsed() >= Duration::from_millis(behavior.cursor_blink_ms) {
            app.toggle_cursor();
            last_cursor_toggle = Instant::now();
        }

        let timeout = if app.has_pending_work() {
            Duration::from_millis(BUSY_POLL_MS)
        } else {
            Duration::from_millis(behavior.idle_poll_ms)
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Reset cursor to visible on any keypress
                    app.cursor_visible = true;
                    last_cursor_toggle = Instant::now();

                    if handle_key_event(app, key.code, key.modifiers, config) == HandleResult::Exit
                    {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Handle a key event and return whether to continue or exit.
pub fn handle_key_event(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    config: &Config,
) -> HandleResult {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    // Global shortcuts (work on both screens)
    match code {
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => return HandleResult::Exit,
        KeyCode::Esc => return HandleResult::Exit,
        _ => {}
    }

    if let Screen::Setup(setup) = &mut app.screen {
        return handle_setup_keys(setup, code, ctrl);
    }
    handle_chat_keys(app, code, ctrl, config.behavior.scroll_page_size)
}

/// Handle key events on the setup screen.
fn handle_setup_keys(setup: &mut SetupFlow, code: KeyCode, ctrl: bool) -> HandleResult {
    match code {
        KeyCode::Char('v') if ctrl => setup.toggle_visibility(),
        KeyCode::Char('l') if ctrl => setup.clear(),
        KeyCode::Char('o') if ctrl => {
            if let Err(e) = open::that(API_KEY_URL) {
                tracing::warn!("Could not open browser: {}", e);
                setup.set_hint(format!("Could not open browser. Visit {}", API_KEY_URL));
            }
        }
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => setup.insert_char(c),
        KeyCode::Backspace => setup.backspace(),
        KeyCode::Delete => setup.delete(),
        KeyCode::Left => setup.move_left(),
        KeyCode::Right => setup.move_right(),
        KeyCode::Home => setup.move_home(),
        KeyCode::End => setup.move_end(),
        KeyCode::Enter => {
            setup.submit();
        }
        _ => {}
    }
    HandleResult::Continue
}

/// Handle key events on the chat screen.
fn handle_chat_keys(app: &mut App, code: KeyCode, ctrl: bool, page_size: usize) -> HandleResult {
    if code == KeyCode::Char('b') && ctrl {
        app.sign_out();
        return HandleResult::Continue;
    }

    match code {
        KeyCode::Up => app.scroll.scroll_up(),
        KeyCode::Down => app.scroll.scroll_down(),
        KeyCode::PageUp => app.scroll.scroll_page_up(page_size),
        KeyCode::PageDown => app.scroll.scroll_page_down(page_size),
        KeyCode::Home if ctrl => app.scroll.scroll_to_top(),
        KeyCode::End if ctrl => app.scroll.scroll_to_bottom(),
        _ => {
            if let Screen::Chat(chat) = &mut app.screen {
                handle_draft_keys(chat, code, ctrl);
            }
        }
    }
    HandleResult::Continue
}

/// Editing keys for the chat draft.
fn handle_draft_keys(chat: &mut ChatFlow, code: KeyCode, ctrl: bool) {
    match code {
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => chat.insert_char(c),
        KeyCode::Backspace => chat.backspace(),
        KeyCode::Delete => chat.delete(),
        KeyCode::Left => chat.move_left(),
        KeyCode::Right => chat.move_right(),
        KeyCode::Home => chat.move_home(),
        KeyCode::End => chat.move_end(),
        KeyCode::Enter => {
            chat.send();
        }
        _ => {}
    }
}

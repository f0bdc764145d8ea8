mod common;

use std::sync::Arc;

use common::{memory_store, stored, FakeGemini};
use gemini_panel::auth::{MemoryStore, CREDENTIAL_KEY};
use gemini_panel::error::{MISSING_KEY_MESSAGE, SEND_FAILED_MESSAGE};
use gemini_panel::flow::{ChatEvent, ChatFlow, TurnState, GREETING, NO_RESPONSE_FALLBACK};
use gemini_panel::message::{Message, Role};

fn mounted(api: Arc<FakeGemini>) -> ChatFlow {
    let store = Arc::new(MemoryStore::with_value(CREDENTIAL_KEY, "AIza-stored"));
    let mut chat = ChatFlow::new(store, api);
    chat.mount();
    chat
}

fn type_text(chat: &mut ChatFlow, text: &str) {
    for c in text.chars() {
        chat.insert_char(c);
    }
}

#[tokio::test]
async fn test_mount_seeds_greeting() {
    let chat = mounted(FakeGemini::new());

    assert_eq!(chat.transcript(), &[Message::assistant(GREETING)]);
    assert!(chat.has_credential());
    assert!(chat.error_message().is_none());
    assert_eq!(chat.turn_state(), TurnState::Idle);
}

#[tokio::test]
async fn test_successful_turn_appends_user_then_assistant() {
    let api = FakeGemini::new();
    api.reply("4");
    let mut chat = mounted(api.clone());

    type_text(&mut chat, "2+2?");
    assert!(chat.send());

    // User message shows up before the reply arrives
    assert_eq!(chat.transcript().len(), 2);
    assert_eq!(chat.transcript()[1], Message::user("2+2?"));
    assert_eq!(chat.draft().as_str(), "");
    assert!(chat.is_awaiting());
    assert!(!chat.input_enabled());

    chat.finish_turn().await;

    assert_eq!(
        chat.transcript(),
        &[
            Message::assistant(GREETING),
            Message::user("2+2?"),
            Message::assistant("4"),
        ]
    );
    assert_eq!(chat.turn_state(), TurnState::Idle);
    assert_eq!(api.prompts(), vec!["2+2?".to_string()]);
}

#[tokio::test]
async fn test_failed_turn_rolls_back_user_message() {
    let api = FakeGemini::new();
    api.fail(500);
    let mut chat = mounted(api.clone());

    type_text(&mut chat, "hello");
    assert!(chat.send());
    chat.finish_turn().await;

    assert_eq!(chat.transcript(), &[Message::assistant(GREETING)]);
    assert_eq!(chat.error_message(), Some(SEND_FAILED_MESSAGE));
    assert_eq!(chat.turn_state(), TurnState::Idle);
    assert!(chat.input_enabled());
}

#[tokio::test]
async fn test_next_send_clears_previous_error() {
    let api = FakeGemini::new();
    api.fail(500);
    api.reply("back online");
    let mut chat = mounted(api.clone());

    type_text(&mut chat, "first");
    chat.send();
    chat.finish_turn().await;
    assert!(chat.error_message().is_some());

    type_text(&mut chat, "second");
    assert!(chat.send());
    assert!(chat.error_message().is_none());
    chat.finish_turn().await;

    assert_eq!(chat.transcript().len(), 3);
    assert_eq!(chat.transcript()[2], Message::assistant("back online"));
}

#[tokio::test]
async fn test_send_ignored_while_awaiting() {
    let api = FakeGemini::new();
    let mut chat = mounted(api.clone());

    type_text(&mut chat, "one");
    assert!(chat.send());

    type_text(&mut chat, "two");
    assert_eq!(chat.draft().as_str(), "");
    assert!(!chat.send());

    chat.finish_turn().await;

    assert_eq!(api.generate_calls(), 1);
    assert_eq!(chat.transcript().len(), 3);
}

#[tokio::test]
async fn test_blank_draft_sends_nothing() {
    let api = FakeGemini::new();
    let mut chat = mounted(api.clone());

    assert!(!chat.send());
    type_text(&mut chat, "   ");
    assert!(!chat.can_send());
    assert!(!chat.send());
    chat.finish_turn().await;

    assert_eq!(api.generate_calls(), 0);
    assert_eq!(chat.transcript().len(), 1);
}

#[tokio::test]
async fn test_draft_is_trimmed_before_sending() {
    let api = FakeGemini::new();
    let mut chat = mounted(api.clone());

    type_text(&mut chat, "  spaced out  ");
    chat.send();
    chat.finish_turn().await;

    assert_eq!(chat.transcript()[1], Message::user("spaced out"));
    assert_eq!(api.prompts(), vec!["spaced out".to_string()]);
}

#[tokio::test]
async fn test_empty_reply_uses_fallback() {
    let api = FakeGemini::new();
    api.reply_empty();
    let mut chat = mounted(api);

    type_text(&mut chat, "anything?");
    chat.send();
    chat.finish_turn().await;

    let last = chat.transcript().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, NO_RESPONSE_FALLBACK);
}

#[tokio::test]
async fn test_poll_turn_applies_reply() {
    let api = FakeGemini::new();
    api.reply("polled");
    let mut chat = mounted(api);

    type_text(&mut chat, "hi");
    chat.send();
    assert!(!chat.poll_turn());

    let mut done = false;
    for _ in 0..100 {
        tokio::task::yield_now().await;
        if chat.poll_turn() {
            done = true;
            break;
        }
    }

    assert!(done);
    assert_eq!(chat.transcript().last().unwrap().content, "polled");
}

#[tokio::test]
async fn test_missing_key_disables_input() {
    let api = FakeGemini::new();
    let mut chat = ChatFlow::new(memory_store(), api.clone());
    chat.mount();

    assert_eq!(chat.error_message(), Some(MISSING_KEY_MESSAGE));
    assert!(!chat.has_credential());
    assert!(!chat.input_enabled());
    assert_eq!(chat.transcript(), &[Message::assistant(GREETING)]);

    type_text(&mut chat, "hello");
    assert!(!chat.send());
    assert_eq!(api.generate_calls(), 0);
}

#[tokio::test]
async fn test_sign_out_removes_key() {
    let store = Arc::new(MemoryStore::with_value(CREDENTIAL_KEY, "AIza-stored"));
    let mut chat = ChatFlow::new(store.clone(), FakeGemini::new());
    chat.mount();

    assert_eq!(chat.sign_out(), ChatEvent::SignedOut);
    assert!(stored(store.as_ref()).is_none());
}

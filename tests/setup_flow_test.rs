mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{memory_store, stored, FakeGemini, ReadOnlyStore};
use gemini_panel::auth::{FileStore, KeyValueStore, MemoryStore, CREDENTIAL_KEY};
use gemini_panel::error::INVALID_KEY_MESSAGE;
use gemini_panel::flow::{SetupEvent, SetupFlow, SetupStatus};

const SAVED_DISPLAY: Duration = Duration::from_millis(1000);

fn type_text(flow: &mut SetupFlow, text: &str) {
    for c in text.chars() {
        flow.insert_char(c);
    }
}

fn clear_field(flow: &mut SetupFlow) {
    flow.move_end();
    while !flow.candidate().as_str().is_empty() {
        flow.backspace();
    }
}

// ============================================
// Validation and persistence
// ============================================

#[tokio::test]
async fn test_accepted_key_is_stored_and_completes_after_delay() {
    let store = memory_store();
    let api = FakeGemini::accepting("AIza-good");
    let mut flow = SetupFlow::new(store.clone(), api.clone(), SAVED_DISPLAY);

    assert!(flow.mount().is_none());
    type_text(&mut flow, "AIza-good");
    assert!(flow.submit());
    assert_eq!(flow.status(), SetupStatus::Validating);
    assert!(!flow.is_editable());

    flow.finish_validation().await;

    assert_eq!(api.probed_keys(), vec!["AIza-good".to_string()]);
    assert_eq!(stored(store.as_ref()), Some("AIza-good".to_string()));
    assert_eq!(flow.status(), SetupStatus::Saved);
    assert_eq!(
        flow.status().footer(),
        "API key validated and stored successfully"
    );
    assert!(flow.error_message().is_none());

    let now = Instant::now();
    assert!(flow.tick_at(now + Duration::from_millis(500)).is_none());
    assert_eq!(
        flow.tick_at(now + Duration::from_millis(1100)),
        Some(SetupEvent::Completed)
    );
    // Completion fires exactly once
    assert!(flow.tick_at(now + Duration::from_millis(2000)).is_none());
}

#[tokio::test]
async fn test_blank_candidate_is_never_probed() {
    let store = memory_store();
    let api = FakeGemini::new();
    let mut flow = SetupFlow::new(store.clone(), api.clone(), SAVED_DISPLAY);

    assert!(!flow.submit());
    type_text(&mut flow, "   ");
    assert!(!flow.can_submit());
    assert!(!flow.submit());
    flow.finish_validation().await;

    assert_eq!(api.probe_calls(), 0);
    assert_eq!(flow.status(), SetupStatus::Idle);
    assert!(flow.error_message().is_none());
    assert!(stored(store.as_ref()).is_none());
}

#[tokio::test]
async fn test_rejected_key_then_valid_key() {
    let store = memory_store();
    let api = FakeGemini::accepting("AIza-good");
    let mut flow = SetupFlow::new(store.clone(), api.clone(), SAVED_DISPLAY);

    type_text(&mut flow, "bad-key");
    assert!(flow.submit());
    flow.finish_validation().await;

    assert_eq!(flow.error_message(), Some(INVALID_KEY_MESSAGE));
    assert!(stored(store.as_ref()).is_none());
    assert_eq!(flow.status(), SetupStatus::Idle);
    assert!(flow.is_editable());

    // Editing the field clears the error
    clear_field(&mut flow);
    assert!(flow.error_message().is_none());

    type_text(&mut flow, "AIza-good");
    assert!(flow.submit());
    flow.finish_validation().await;

    assert_eq!(api.probe_calls(), 2);
    assert!(flow.error_message().is_none());
    assert_eq!(stored(store.as_ref()), Some("AIza-good".to_string()));
    assert!(flow.is_saved());
}

#[tokio::test]
async fn test_candidate_is_stored_verbatim() {
    let store = memory_store();
    let api = FakeGemini::accepting(" AIza-padded ");
    let mut flow = SetupFlow::new(store.clone(), api.clone(), SAVED_DISPLAY);

    type_text(&mut flow, " AIza-padded ");
    assert!(flow.submit());
    flow.finish_validation().await;

    assert_eq!(stored(store.as_ref()), Some(" AIza-padded ".to_string()));
}

#[tokio::test]
async fn test_store_write_failure_reports_and_stays_on_setup() {
    let store = Arc::new(ReadOnlyStore::default());
    let api = FakeGemini::accepting("AIza-good");
    let mut flow = SetupFlow::new(store.clone(), api.clone(), SAVED_DISPLAY);

    type_text(&mut flow, "AIza-good");
    assert!(flow.submit());
    flow.finish_validation().await;

    let message = flow.error_message().expect("persistence error shown");
    assert!(message.starts_with("Failed to save API key"));
    assert!(!flow.is_saved());
    assert!(!flow.is_saving());
    assert!(flow
        .tick_at(Instant::now() + Duration::from_secs(5))
        .is_none());
}

#[tokio::test]
async fn test_submit_ignored_while_validating() {
    let store = memory_store();
    let api = FakeGemini::accepting("AIza-good");
    let mut flow = SetupFlow::new(store.clone(), api.clone(), SAVED_DISPLAY);

    type_text(&mut flow, "AIza-good");
    assert!(flow.submit());
    assert!(!flow.submit());

    // Edits are ignored while the probe is in flight
    flow.insert_char('x');
    assert_eq!(flow.candidate().as_str(), "AIza-good");

    flow.finish_validation().await;
    assert_eq!(api.probe_calls(), 1);

    // And once saved, the button stays disabled
    assert!(!flow.submit());
}

#[tokio::test]
async fn test_poll_validation_applies_result_without_blocking() {
    let store = memory_store();
    let api = FakeGemini::accepting("AIza-good");
    let mut flow = SetupFlow::new(store.clone(), api.clone(), SAVED_DISPLAY);

    type_text(&mut flow, "AIza-good");
    flow.submit();

    let mut done = false;
    for _ in 0..100 {
        if flow.poll_validation() {
            done = true;
            break;
        }
        tokio::task::yield_now().await;
    }

    assert!(done);
    assert!(flow.is_saved());
}

// ============================================
// Mount and clear
// ============================================

#[tokio::test]
async fn test_mount_with_stored_key_completes_without_probe() {
    let store = Arc::new(MemoryStore::with_value(CREDENTIAL_KEY, "AIza-stored"));
    let api = FakeGemini::new();
    let mut flow = SetupFlow::new(store, api.clone(), SAVED_DISPLAY);

    assert_eq!(flow.mount(), Some(SetupEvent::Completed));
    assert_eq!(flow.candidate().as_str(), "AIza-stored");
    assert_eq!(api.probe_calls(), 0);
}

#[tokio::test]
async fn test_clear_resets_form_and_removes_stored_key() {
    let store = memory_store();
    store.set(CREDENTIAL_KEY, "AIza-old").unwrap();
    store.set("otherKey", "kept").unwrap();
    let api = FakeGemini::new();
    let mut flow = SetupFlow::new(store.clone(), api, SAVED_DISPLAY);

    type_text(&mut flow, "bad");
    flow.submit();
    flow.finish_validation().await;
    assert!(flow.error_message().is_some());

    flow.clear();

    assert_eq!(flow.candidate().as_str(), "");
    assert!(flow.error_message().is_none());
    assert!(stored(store.as_ref()).is_none());
    assert_eq!(store.get("otherKey").unwrap(), Some("kept".to_string()));
}

#[tokio::test]
async fn test_visibility_toggle_masks_candidate() {
    let mut flow = SetupFlow::new(memory_store(), FakeGemini::new(), SAVED_DISPLAY);
    type_text(&mut flow, "abc");

    assert!(!flow.is_visible());
    assert_eq!(flow.display_candidate(), "•••");

    flow.toggle_visibility();
    assert!(flow.is_visible());
    assert_eq!(flow.display_candidate(), "abc");
}

#[tokio::test]
async fn test_clear_ignored_while_saved_is_showing() {
    let store = memory_store();
    let api = FakeGemini::accepting("AIza-good");
    let mut flow = SetupFlow::new(store.clone(), api, SAVED_DISPLAY);

    type_text(&mut flow, "AIza-good");
    flow.submit();
    flow.finish_validation().await;
    assert!(flow.is_saved());

    flow.clear();

    assert_eq!(stored(store.as_ref()), Some("AIza-good".to_string()));
    assert_eq!(flow.candidate().as_str(), "AIza-good");
    assert_eq!(
        flow.tick_at(Instant::now() + SAVED_DISPLAY),
        Some(SetupEvent::Completed)
    );
}

#[tokio::test]
async fn test_torn_store_file_does_not_block_setup() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");
    std::fs::write(&path, r#"{"geminiApiKey": "AIz"#).unwrap();
    let store = Arc::new(FileStore::new(&path));
    let api = FakeGemini::accepting("AIza-good");
    let mut flow = SetupFlow::new(store.clone(), api, SAVED_DISPLAY);

    assert!(flow.mount().is_none());
    flow.clear();

    type_text(&mut flow, "AIza-good");
    assert!(flow.submit());
    flow.finish_validation().await;

    assert!(flow.error_message().is_none());
    assert!(flow.is_saved());
    assert_eq!(stored(store.as_ref()), Some("AIza-good".to_string()));
}

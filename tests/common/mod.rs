//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gemini_panel::auth::{KeyValueStore, MemoryStore, StoreError, StoreResult};
use gemini_panel::llm::{GeminiApi, GeminiError, GeminiResult};

/// Scripted stand-in for the Gemini API.
///
/// Probes succeed only for keys in `valid_keys`. Generate calls pop the next
/// scripted reply, or answer `"ok"` when the script is empty.
#[derive(Default)]
pub struct FakeGemini {
    valid_keys: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<GeminiResult<Option<String>>>>,
    probes: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    generate_calls: AtomicUsize,
}

impl FakeGemini {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn accepting(key: &str) -> Arc<Self> {
        let fake = Self::default();
        fake.valid_keys.lock().unwrap().push(key.to_string());
        Arc::new(fake)
    }

    pub fn accept(&self, key: &str) {
        self.valid_keys.lock().unwrap().push(key.to_string());
    }

    pub fn reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(Some(text.to_string())));
    }

    pub fn reply_empty(&self) {
        self.replies.lock().unwrap().push_back(Ok(None));
    }

    pub fn fail(&self, status: u16) {
        self.replies.lock().unwrap().push_back(Err(GeminiError::Api {
            status,
            message: "Internal error".to_string(),
        }));
    }

    pub fn probe_calls(&self) -> usize {
        self.probes.lock().unwrap().len()
    }

    pub fn probed_keys(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeminiApi for FakeGemini {
    async fn probe(&self, api_key: &str) -> GeminiResult<()> {
        self.probes.lock().unwrap().push(api_key.to_string());
        if self.valid_keys.lock().unwrap().iter().any(|k| k == api_key) {
            Ok(())
        } else {
            Err(GeminiError::Api {
                status: 400,
                message: "API key not valid. Please pass a valid API key.".to_string(),
            })
        }
    }

    async fn generate(&self, _api_key: &str, prompt: &str) -> GeminiResult<Option<String>> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some("ok".to_string())))
    }
}

/// A store that reads and deletes fine but refuses every write.
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemoryStore,
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key)
    }
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn stored(store: &dyn KeyValueStore) -> Option<String> {
    store.get(gemini_panel::auth::CREDENTIAL_KEY).unwrap()
}

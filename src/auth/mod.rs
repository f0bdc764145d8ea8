//! Credential persistence.
//!
//! The API key lives in a [`KeyValueStore`] under [`CREDENTIAL_KEY`]. Flows
//! receive the store as an `Arc<dyn KeyValueStore>` instead of reaching for a
//! global.

mod storage;

pub use storage::{
    FileStore, KeyValueStore, MemoryStore, StoreError, StoreResult, CREDENTIAL_KEY,
};

/// Read the stored API key, treating an empty value as absent.
pub fn load_credential(store: &dyn KeyValueStore) -> StoreResult<Option<String>> {
    Ok(store.get(CREDENTIAL_KEY)?.filter(|key| !key.is_empty()))
}

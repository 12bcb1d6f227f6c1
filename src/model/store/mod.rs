//! Storage-agnostic key-value persistence.
//!
//! Every persisted value is JSON text under a fixed string key, so the same
//! snapshot can live in a directory of files, in signed browser cookies, or
//! in memory for tests.

use rocket::serde::json::serde_json;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

mod cookie;
mod file;
mod memory;

pub use cookie::CookieStore;
pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to sign stored value: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Stored value under `{key}` is malformed: {source}")]
    Format {
        key: &'static str,
        source: serde_json::Error,
    },
}

/// A string-keyed store of serialized values. Writes are synchronous.
pub trait KeyValueStore {
    /// Read the value under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A type that is persisted as a whole under a single key.
pub trait Persisted: Serialize + DeserializeOwned {
    /// The key this value lives under.
    const KEY: &'static str;

    fn load_from<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Self>, StoreError> {
        store
            .load(Self::KEY)?
            .map(|text| {
                serde_json::from_str(&text).map_err(|source| StoreError::Format {
                    key: Self::KEY,
                    source,
                })
            })
            .transpose()
    }

    fn save_to<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        let text = serde_json::to_string(self).map_err(|source| StoreError::Format {
            key: Self::KEY,
            source,
        })?;
        store.save(Self::KEY, &text)
    }

    fn remove_from<S: KeyValueStore + ?Sized>(store: &S) -> Result<(), StoreError> {
        store.remove(Self::KEY)
    }
}

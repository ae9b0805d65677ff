//! Local ephemeral cache used as a cold-start placeholder.
//!
//! The cache is a plain key-value string store. The client reads the note sequence from it
//! once at startup, before the document store answers, and may mirror the collection back
//! into it after each mutation.

use crate::note::Note;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

#[cfg(feature = "native")]
mod file;
#[cfg(feature = "wasm-js")]
mod wasm_js;

#[cfg(feature = "native")]
pub use file::FileCache;
#[cfg(feature = "wasm-js")]
pub use wasm_js::LocalStorageCache;

/// The key the note sequence is cached under unless configured otherwise.
pub const NOTES_CACHE_KEY: &str = "notes";

/// Errors raised by a [`NoteCache`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A file-backed cache failed on the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The cached value is not a note sequence.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The backing storage could not be reached.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Trait for the local key-value string cache.
pub trait NoteCache: Send {
    /// Retrieves a cached value by key.
    ///
    /// # Returns
    /// * `Ok(Some(String))` if the key exists
    /// * `Ok(None)` if the key does not exist
    /// * `Err(CacheError)` if the cache could not be read
    fn get(&mut self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores a value under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Removes the value under `key`. Removing a missing key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), CacheError>;
}

/// Reads the note sequence cached under `key`.
pub fn read_notes(cache: &mut dyn NoteCache, key: &str) -> Result<Option<Vec<Note>>, CacheError> {
    match cache.get(key)? {
        Some(value) => Ok(Some(serde_json::from_str(&value)?)),
        None => Ok(None),
    }
}

/// Caches `notes` under `key` in the same shape as the document's `notes` field.
pub fn write_notes(cache: &mut dyn NoteCache, key: &str, notes: &[Note]) -> Result<(), CacheError> {
    let value = serde_json::to_string(notes)?;
    cache.set(key, &value)
}

/// In-process [`NoteCache`]. Clones share the same entries.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw cached value for `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl NoteCache for MemoryCache {
    fn get(&mut self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

impl From<MemoryCache> for Box<dyn NoteCache> {
    fn from(cache: MemoryCache) -> Self {
        Box::new(cache)
    }
}

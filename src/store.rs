//! Document stores holding one [`NotesDocument`] per user.
//!
//! A store is a remote key-value collaborator: `get` returns the user's document or `None`
//! when it does not exist, `set` overwrites it whole. There is no partial update.

use crate::api::NotesDocument;
#[cfg(not(target_family = "wasm"))]
use futures::future::BoxFuture;
#[cfg(target_family = "wasm")]
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

#[cfg(feature = "native")]
mod file;

#[cfg(feature = "native")]
pub use file::FileDocumentStore;

#[cfg(not(target_family = "wasm"))]
pub type StoreFuture<'a, T> = BoxFuture<'a, T>;
#[cfg(target_family = "wasm")]
pub type StoreFuture<'a, T> = LocalBoxFuture<'a, T>;

/// Errors raised by a [`DocumentStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document could not be read.
    #[error("Failed to read document for user {user_id}: {reason}")]
    Read { user_id: String, reason: String },
    /// The document could not be written.
    #[error("Failed to write document for user {user_id}: {reason}")]
    Write { user_id: String, reason: String },
    /// The document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A file-backed store failed on the filesystem.
    #[error("File error: {0}")]
    File(#[from] std::io::Error),
    /// The store refused the request before reaching the backend.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for the per-user remote document.
pub trait DocumentStore: Send + Sync {
    /// Fetches the document keyed by `user_id`.
    ///
    /// # Returns
    /// * `Ok(Some(NotesDocument))` if the document exists
    /// * `Ok(None)` if it does not
    /// * `Err(StoreError)` on transport or decoding failure
    fn get<'a>(&'a self, user_id: &'a str)
    -> StoreFuture<'a, Result<Option<NotesDocument>, StoreError>>;

    /// Overwrites the document keyed by `user_id`.
    fn set<'a>(
        &'a self,
        user_id: &'a str,
        document: NotesDocument,
    ) -> StoreFuture<'a, Result<(), StoreError>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn get<'a>(
        &'a self,
        user_id: &'a str,
    ) -> StoreFuture<'a, Result<Option<NotesDocument>, StoreError>> {
        (**self).get(user_id)
    }

    fn set<'a>(
        &'a self,
        user_id: &'a str,
        document: NotesDocument,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        (**self).set(user_id, document)
    }
}

/// In-process [`DocumentStore`] keeping documents in a map.
///
/// Clones share the same documents. Reads and writes can be made to fail, which is how
/// the transport failures of a remote store are reproduced offline.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    documents: Arc<Mutex<HashMap<String, NotesDocument>>>,
    writes: Arc<AtomicUsize>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the document for `user_id` without counting it as a write.
    pub fn insert<U: Into<String>>(&self, user_id: U, document: NotesDocument) {
        self.documents.lock().insert(user_id.into(), document);
    }

    /// Returns a copy of the stored document for `user_id`.
    pub fn document(&self, user_id: &str) -> Option<NotesDocument> {
        self.documents.lock().get(user_id).cloned()
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get<'a>(
        &'a self,
        user_id: &'a str,
    ) -> StoreFuture<'a, Result<Option<NotesDocument>, StoreError>> {
        Box::pin(async move {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Read {
                    user_id: user_id.to_string(),
                    reason: "read rejected".to_string(),
                });
            }
            Ok(self.document(user_id))
        })
    }

    fn set<'a>(
        &'a self,
        user_id: &'a str,
        document: NotesDocument,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Write {
                    user_id: user_id.to_string(),
                    reason: "write rejected".to_string(),
                });
            }
            self.documents.lock().insert(user_id.to_string(), document);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.get("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_whole_document() {
        let store = MemoryDocumentStore::new();
        let first = NotesDocument::new(vec![Note::with_id("a", "A", "1")]);
        let second = NotesDocument::new(vec![Note::with_id("b", "B", "2")]);
        store.set("u1", first).await.unwrap();
        store.set("u1", second.clone()).await.unwrap();
        assert_eq!(store.get("u1").await.unwrap(), Some(second));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn documents_are_keyed_by_user() {
        let store = MemoryDocumentStore::new();
        store.insert("u1", NotesDocument::new(vec![Note::with_id("a", "A", "1")]));
        assert_eq!(store.get("u2").await.unwrap(), None);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let store = MemoryDocumentStore::new();
        store.set_fail_reads(true);
        store.set_fail_writes(true);
        assert!(matches!(
            store.get("u1").await,
            Err(StoreError::Read { .. })
        ));
        assert!(matches!(
            store.set("u1", NotesDocument::default()).await,
            Err(StoreError::Write { .. })
        ));
        assert_eq!(store.document("u1"), None);
    }

    #[tokio::test]
    async fn clones_share_documents() {
        let store = MemoryDocumentStore::new();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        shared.set("u1", NotesDocument::default()).await.unwrap();
        assert_eq!(store.document("u1"), Some(NotesDocument::default()));
    }
}

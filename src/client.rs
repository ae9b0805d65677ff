//! The note collection manager.
//!
//! [`NotesClient`] owns the signed-in user's notes, applies mutations in call order and writes
//! the whole collection to the [`DocumentStore`] after each of them. Store failures are logged
//! and swallowed: the in-memory collection stays the source of truth for the session.

use crate::{
    api::{AuthUser, NotesDocument},
    cache::{self, CacheError, NOTES_CACHE_KEY, NoteCache},
    callback::{OnAuthChanged, OnNotesChanged},
    collection::{Mutation, NoteCollection},
    identity::{AuthError, IdentityProvider},
    note::{Note, NoteId},
    option::NotesClientOptions,
    session::{SessionState, UserSession},
    store::{DocumentStore, StoreError},
    util::spawn::{MaybeSend, spawn},
};
use futures::{
    channel::oneshot,
    future::{FutureExt, Shared, join_all},
};
use parking_lot::Mutex;
use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// The error type for the notes client.
#[derive(Error, Debug)]
pub enum NotesClientError {
    /// An error from the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// An error from the local cache.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    /// An error from the identity provider.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// How a synchronization ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The collection was written to the user's document.
    Written { user_id: String, notes: usize },
    /// Nobody was signed in, so nothing was written.
    Skipped,
    /// The store rejected the write. The in-memory collection is unchanged.
    Failed(String),
}

/// Handle to an issued synchronization.
///
/// Dropping the handle does not cancel the write.
#[derive(Clone)]
pub struct SyncHandle(Shared<oneshot::Receiver<SyncOutcome>>);

impl SyncHandle {
    fn ready(outcome: SyncOutcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self(rx.shared())
    }

    /// Waits for the write to finish.
    pub async fn outcome(self) -> SyncOutcome {
        self.0
            .await
            .unwrap_or_else(|_| SyncOutcome::Failed("synchronization task dropped".to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.0.peek().is_some()
    }
}

impl fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyncHandle").field(&self.0.peek()).finish()
    }
}

#[derive(Debug, Default)]
struct SessionCell {
    session: Option<UserSession>,
    state: SessionState,
}

pub(crate) struct NotesClientInner {
    notes: Mutex<NoteCollection>,
    session: Mutex<SessionCell>,
    /// Bumped whenever a session starts or ends.
    generation: AtomicU64,
    store: Arc<dyn DocumentStore>,
    cache: Option<Mutex<Box<dyn NoteCache>>>,
    cache_key: String,
    mirror_to_cache: bool,
    skip_unchanged_sync: bool,
    guard_stale_responses: bool,
    on_notes_changed: Mutex<Vec<OnNotesChanged>>,
    pending: Mutex<Vec<oneshot::Receiver<()>>>,
}

impl fmt::Debug for NotesClientInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesClientInner")
            .field("notes", &self.notes.lock().len())
            .field("session", &*self.session.lock())
            .field("cache_key", &self.cache_key)
            .field("mirror_to_cache", &self.mirror_to_cache)
            .field("skip_unchanged_sync", &self.skip_unchanged_sync)
            .field("guard_stale_responses", &self.guard_stale_responses)
            .finish()
    }
}

/// The tool for managing a user's notes.
///
/// It maintains the in-memory collection and keeps the user's remote document consistent with it.
/// Clones share the same state.
#[derive(Clone, Debug)]
pub struct NotesClient(Arc<NotesClientInner>);

impl NotesClient {
    /// Creates a new [`NotesClient`] with default options.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::new_with_options(NotesClientOptions::builder().store(store).build())
    }

    /// Creates a new [`NotesClient`] with the provided options.
    ///
    /// When a cache is configured, its note sequence seeds the collection until a document is loaded.
    pub fn new_with_options(options: NotesClientOptions) -> Self {
        let cache_key = options
            .cache_key
            .unwrap_or_else(|| NOTES_CACHE_KEY.to_string());
        let mut cache = options.cache;
        let seed = cache
            .as_deref_mut()
            .map(|cache| Self::read_seed(cache, &cache_key))
            .unwrap_or_default();

        Self(Arc::new(NotesClientInner {
            notes: Mutex::new(seed),
            session: Mutex::new(SessionCell::default()),
            generation: AtomicU64::new(0),
            store: options.store,
            cache: cache.map(Mutex::new),
            cache_key,
            mirror_to_cache: options.mirror_to_cache.unwrap_or(false),
            skip_unchanged_sync: options.skip_unchanged_sync.unwrap_or(false),
            guard_stale_responses: options.guard_stale_responses.unwrap_or(true),
            on_notes_changed: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        }))
    }

    fn read_seed(cache: &mut dyn NoteCache, key: &str) -> NoteCollection {
        match cache::read_notes(cache, key) {
            Ok(Some(notes)) => {
                #[cfg(feature = "tracing")]
                debug!("Seeded {} notes from the local cache", notes.len());
                NoteCollection::from_notes(notes)
            }
            Ok(None) => NoteCollection::new(),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!("Failed to read cached notes: {}", _e);
                NoteCollection::new()
            }
        }
    }

    /// Returns a snapshot of the collection in display order.
    pub fn notes(&self) -> Vec<Note> {
        self.0.notes.lock().to_vec()
    }

    pub fn get(&self, id: &NoteId) -> Option<Note> {
        self.0.notes.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.notes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.notes.lock().is_empty()
    }

    /// Returns the current session, if a user is signed in.
    pub fn session(&self) -> Option<UserSession> {
        self.0.session.lock().session.clone()
    }

    /// Returns the signed-in user's id.
    pub fn user_id(&self) -> Option<String> {
        self.0
            .session
            .lock()
            .session
            .as_ref()
            .map(|s| s.user_id.clone())
    }

    /// Returns the signed-in user's display name.
    pub fn display_name(&self) -> Option<String> {
        self.0
            .session
            .lock()
            .session
            .as_ref()
            .map(|s| s.display_name.clone())
    }

    pub fn state(&self) -> SessionState {
        self.0.session.lock().state
    }

    /// Registers a callback invoked with a snapshot after every change to the collection.
    pub fn on_notes_changed<F: Into<OnNotesChanged>>(&self, callback: F) {
        self.0.on_notes_changed.lock().push(callback.into());
    }

    /// Fetches the document of `user_id` and makes it the collection.
    ///
    /// A missing document is created empty. On failure the error is logged and the
    /// current in-memory collection is returned unchanged.
    pub async fn load(&self, user_id: &str) -> Vec<Note> {
        match self.try_load(user_id).await {
            Ok(notes) => notes,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!("Error getting document for user {}: {}", user_id, _e);
                self.notes()
            }
        }
    }

    /// Same as [`load`](Self::load) but reports failures to the caller.
    pub async fn try_load(&self, user_id: &str) -> Result<Vec<Note>, NotesClientError> {
        if user_id.is_empty() {
            #[cfg(feature = "tracing")]
            warn!("Refusing to load notes without a user id");
            return Err(AuthError::NotAuthenticated.into());
        }

        let generation = self.ensure_session(user_id);
        match self.fetch_notes(user_id).await {
            Ok(notes) => Ok(self.apply_loaded(generation, user_id, notes)),
            Err(e) => {
                self.finish_loading(generation);
                Err(e)
            }
        }
    }

    async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>, NotesClientError> {
        match self.0.store.get(user_id).await? {
            Some(document) => Ok(document.notes),
            None => {
                #[cfg(feature = "tracing")]
                info!("No document for user {}, creating one", user_id);
                self.0.store.set(user_id, NotesDocument::default()).await?;
                #[cfg(feature = "tracing")]
                info!("Document for user {} successfully created", user_id);
                Ok(Vec::new())
            }
        }
    }

    fn apply_loaded(&self, generation: u64, _user_id: &str, notes: Vec<Note>) -> Vec<Note> {
        if self.0.guard_stale_responses && !self.is_current(generation) {
            #[cfg(feature = "tracing")]
            warn!("Dropping stale document for user {}", _user_id);
            return NoteCollection::from_notes(notes).to_vec();
        }

        let snapshot = {
            let mut collection = self.0.notes.lock();
            collection.replace(notes);
            collection.to_vec()
        };
        self.finish_loading(generation);
        self.after_change(&snapshot);
        snapshot
    }

    fn finish_loading(&self, generation: u64) {
        let mut cell = self.0.session.lock();
        if cell
            .session
            .as_ref()
            .is_some_and(|s| s.generation == generation)
        {
            cell.state = SessionState::Ready;
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.0.generation.load(Ordering::SeqCst) == generation
    }

    /// Appends a note unless `text` is blank, then synchronizes.
    ///
    /// Returns the new note's id, or `None` when the note was ignored.
    pub fn add<T, S>(&self, title: T, text: S) -> Option<NoteId>
    where
        T: Into<String>,
        S: Into<String>,
    {
        let (mutation, snapshot) = {
            let mut collection = self.0.notes.lock();
            let mutation = collection.add(title, text);
            (mutation, collection.to_vec())
        };
        let Mutation::Added(id) = mutation else {
            #[cfg(feature = "tracing")]
            debug!("Ignoring note with empty text");
            return None;
        };
        self.after_change(&snapshot);
        self.synchronize_snapshot(snapshot);
        Some(id)
    }

    /// Replaces title and text of the note with `id`, then synchronizes.
    ///
    /// Returns whether the note exists. The write happens even when nothing matched unless
    /// `skip_unchanged_sync` is set.
    pub fn edit<T, S>(&self, id: &NoteId, title: T, text: S) -> bool
    where
        T: Into<String>,
        S: Into<String>,
    {
        let (mutation, snapshot) = {
            let mut collection = self.0.notes.lock();
            let mutation = collection.edit(id, title, text);
            (mutation, collection.to_vec())
        };
        self.finish_mutation(mutation, snapshot)
    }

    /// Removes the note with `id`, then synchronizes.
    ///
    /// Returns whether a note was removed.
    pub fn delete(&self, id: &NoteId) -> bool {
        let (mutation, snapshot) = {
            let mut collection = self.0.notes.lock();
            let mutation = collection.delete(id);
            (mutation, collection.to_vec())
        };
        self.finish_mutation(mutation, snapshot)
    }

    fn finish_mutation(&self, mutation: Mutation, snapshot: Vec<Note>) -> bool {
        let found = mutation != Mutation::Ignored;
        #[cfg(feature = "tracing")]
        match &mutation {
            Mutation::Edited { id, changed } => {
                debug!("Edited note {} (changed: {})", id, changed)
            }
            Mutation::Deleted(note) => debug!("Deleted note {} ({:?})", note.id, note.title),
            Mutation::Added(_) | Mutation::Ignored => debug!("No note matched the id"),
        }
        if mutation.changed() {
            self.after_change(&snapshot);
        } else if self.0.skip_unchanged_sync {
            #[cfg(feature = "tracing")]
            debug!("Collection unchanged, skipping synchronization");
            return found;
        }
        self.synchronize_snapshot(snapshot);
        found
    }

    /// Writes the whole collection to the signed-in user's document.
    ///
    /// The write runs in the background; failures are logged and never roll back the collection.
    pub fn synchronize(&self) -> SyncHandle {
        self.synchronize_snapshot(self.notes())
    }

    fn synchronize_snapshot(&self, notes: Vec<Note>) -> SyncHandle {
        let Some(user_id) = self.user_id() else {
            #[cfg(feature = "tracing")]
            warn!("No signed-in user, skipping synchronization");
            return SyncHandle::ready(SyncOutcome::Skipped);
        };

        let (tx, rx) = oneshot::channel();
        let store = self.0.store.clone();
        let count = notes.len();
        self.spawn_tracked(async move {
            let outcome = match store.set(&user_id, NotesDocument::new(notes)).await {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    debug!("Document for user {} successfully written", user_id);
                    SyncOutcome::Written {
                        user_id,
                        notes: count,
                    }
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    error!("Error writing document for user {}: {}", user_id, e);
                    SyncOutcome::Failed(e.to_string())
                }
            };
            let _ = tx.send(outcome);
        });
        SyncHandle(rx.shared())
    }

    /// Waits until every background load and write issued so far has finished.
    pub async fn flush(&self) {
        loop {
            let pending = std::mem::take(&mut *self.0.pending.lock());
            if pending.is_empty() {
                break;
            }
            join_all(pending).await;
        }
    }

    pub(crate) fn spawn_tracked<F>(&self, future: F)
    where
        F: Future<Output = ()> + MaybeSend + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        {
            let mut pending = self.0.pending.lock();
            pending.retain_mut(|rx| matches!(rx.try_recv(), Ok(None)));
            pending.push(done_rx);
        }
        spawn(async move {
            future.await;
            let _ = done_tx.send(());
        });
    }

    fn after_change(&self, snapshot: &[Note]) {
        self.mirror_to_cache(snapshot);
        // Callbacks may read the client, so they run without any lock held.
        let callbacks = self.0.on_notes_changed.lock().clone();
        for callback in callbacks {
            callback.call(snapshot);
        }
    }

    fn mirror_to_cache(&self, snapshot: &[Note]) {
        if !self.0.mirror_to_cache {
            return;
        }
        if let Some(cache) = self.0.cache.as_ref() {
            let mut cache = cache.lock();
            if let Err(_e) = cache::write_notes(&mut **cache, &self.0.cache_key, snapshot) {
                #[cfg(feature = "tracing")]
                error!("Failed to cache notes: {}", _e);
            }
        }
    }

    fn clear_cache(&self) {
        if !self.0.mirror_to_cache {
            return;
        }
        if let Some(cache) = self.0.cache.as_ref() {
            if let Err(_e) = cache.lock().remove(&self.0.cache_key) {
                #[cfg(feature = "tracing")]
                error!("Failed to clear cached notes: {}", _e);
            }
        }
    }

    /// Makes `user_id` the session user, keeping the session if it already is.
    fn ensure_session(&self, user_id: &str) -> u64 {
        self.begin_session(AuthUser::new(user_id, ""))
    }

    fn begin_session(&self, user: AuthUser) -> u64 {
        let mut guard = self.0.session.lock();
        let cell = &mut *guard;
        if let Some(current) = cell.session.as_mut() {
            if current.user_id == user.uid {
                if !user.display_name.is_empty() {
                    current.display_name = user.display_name;
                }
                cell.state = SessionState::Loading;
                return current.generation;
            }
        }

        let switched = cell.session.is_some();
        let generation = self.0.generation.fetch_add(1, Ordering::SeqCst) + 1;
        #[cfg(feature = "tracing")]
        info!("Starting session for user {}", user.uid);
        cell.session = Some(UserSession::new(user, generation));
        cell.state = SessionState::Loading;
        drop(guard);

        // Another user's notes must never be written to this user's document.
        if switched {
            self.0.notes.lock().clear();
            self.after_change(&[]);
        }
        generation
    }

    fn end_session(&self) {
        let ended = {
            let mut cell = self.0.session.lock();
            cell.state = SessionState::Unauthenticated;
            cell.session.take()
        };
        let Some(_session) = ended else {
            return;
        };
        self.0.generation.fetch_add(1, Ordering::SeqCst);
        #[cfg(feature = "tracing")]
        info!("Session for user {} ended", _session.user_id);

        self.0.notes.lock().clear();
        self.clear_cache();
        let callbacks = self.0.on_notes_changed.lock().clone();
        for callback in callbacks {
            callback.call(&[]);
        }
    }

    /// Applies an authentication change reported by an identity provider.
    ///
    /// A user starts (or refreshes) the session and loads their document in the background;
    /// `None` ends the session and clears the collection.
    pub fn handle_auth_changed(&self, user: Option<AuthUser>) {
        match user {
            Some(user) => {
                let user_id = user.uid.clone();
                self.begin_session(user);
                let client = self.clone();
                self.spawn_tracked(async move {
                    client.load(&user_id).await;
                });
            }
            None => self.end_session(),
        }
    }

    /// Follows the authentication state of `provider`.
    ///
    /// The provider only holds a weak reference to the client.
    pub fn attach(&self, provider: &dyn IdentityProvider) {
        let weak = Arc::downgrade(&self.0);
        provider.on_auth_changed(OnAuthChanged::from(move |user: Option<AuthUser>| {
            if let Some(inner) = weak.upgrade() {
                NotesClient(inner).handle_auth_changed(user);
            }
        }));
    }

    /// Signs the user out through `provider` and clears the session.
    ///
    /// If the provider fails, the error is logged and the session is kept.
    pub async fn sign_out(&self, provider: &dyn IdentityProvider) {
        match provider.sign_out().await {
            Ok(()) => self.end_session(),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!("Failed to sign out: {}", _e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{MemoryCache, read_notes, write_notes},
        identity::MemoryIdentityProvider,
        store::{MemoryDocumentStore, StoreFuture},
    };

    fn client_with_store() -> (NotesClient, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        (NotesClient::new(Arc::new(store.clone())), store)
    }

    async fn signed_in(user_id: &str) -> (NotesClient, MemoryDocumentStore) {
        let (client, store) = client_with_store();
        client.load(user_id).await;
        (client, store)
    }

    /// Store whose first `get` waits until the test releases it.
    struct GatedStore {
        inner: MemoryDocumentStore,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl DocumentStore for GatedStore {
        fn get<'a>(
            &'a self,
            user_id: &'a str,
        ) -> StoreFuture<'a, Result<Option<NotesDocument>, StoreError>> {
            let gate = self.gate.lock().take();
            Box::pin(async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                self.inner.get(user_id).await
            })
        }

        fn set<'a>(
            &'a self,
            user_id: &'a str,
            document: NotesDocument,
        ) -> StoreFuture<'a, Result<(), StoreError>> {
            self.inner.set(user_id, document)
        }
    }

    #[tokio::test]
    async fn groceries_scenario() {
        let (client, store) = client_with_store();

        assert_eq!(client.load("u1").await, vec![]);
        assert_eq!(store.document("u1"), Some(NotesDocument::default()));
        assert_eq!(client.state(), SessionState::Ready);

        let id = client.add("Groceries", "Milk, eggs").unwrap();
        assert_eq!(
            client.notes(),
            vec![Note::with_id(id.clone(), "Groceries", "Milk, eggs")]
        );
        client.flush().await;
        assert_eq!(store.document("u1").unwrap().notes, client.notes());

        assert!(client.edit(&id, "Groceries", "Milk, eggs, bread"));
        assert_eq!(client.notes()[0].text, "Milk, eggs, bread");
        assert_eq!(client.notes()[0].id, id);

        assert!(client.delete(&id));
        assert!(client.is_empty());
        client.flush().await;
        assert_eq!(store.document("u1"), Some(NotesDocument::default()));
    }

    #[tokio::test]
    async fn load_returns_existing_notes() {
        let (client, store) = client_with_store();
        let notes = vec![
            Note::with_id("a", "A", "first"),
            Note::with_id("b", "", "second"),
        ];
        store.insert("u1", NotesDocument::new(notes.clone()));
        assert_eq!(client.load("u1").await, notes);
        assert_eq!(client.notes(), notes);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn load_keeps_the_first_of_duplicate_ids() {
        let (client, store) = client_with_store();
        store.insert(
            "u1",
            NotesDocument::new(vec![
                Note::with_id("a", "first", "1"),
                Note::with_id("a", "second", "2"),
            ]),
        );
        assert_eq!(
            client.load("u1").await,
            vec![Note::with_id("a", "first", "1")]
        );
        assert_eq!(client.len(), 1);
    }

    #[tokio::test]
    async fn blank_add_issues_no_synchronization() {
        let (client, store) = signed_in("u1").await;
        let writes = store.write_count();
        assert_eq!(client.add("Title", ""), None);
        assert_eq!(client.add("Title", " \n "), None);
        client.flush().await;
        assert!(client.is_empty());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn add_grows_by_one_with_fresh_id() {
        let (client, _store) = signed_in("u1").await;
        let first = client.add("", "one").unwrap();
        let second = client.add("", "two").unwrap();
        assert_ne!(first, second);
        assert_eq!(client.len(), 2);
        assert_eq!(client.notes()[1].id, second);
    }

    #[tokio::test]
    async fn edit_of_unknown_id_still_writes_by_default() {
        let (client, store) = signed_in("u1").await;
        client.add("A", "first");
        client.flush().await;
        let before = client.notes();
        let writes = store.write_count();

        assert!(!client.edit(&NoteId::from("missing"), "x", "y"));
        assert!(!client.delete(&NoteId::from("missing")));
        client.flush().await;
        assert_eq!(client.notes(), before);
        assert_eq!(store.write_count(), writes + 2);
    }

    #[tokio::test]
    async fn unchanged_edits_can_skip_the_write() {
        let store = MemoryDocumentStore::new();
        let client = NotesClient::new_with_options(
            NotesClientOptions::builder()
                .store(Arc::new(store.clone()))
                .skip_unchanged_sync(true)
                .build(),
        );
        client.load("u1").await;
        let id = client.add("A", "first").unwrap();
        client.flush().await;
        let writes = store.write_count();

        assert!(client.edit(&id, "A", "first"));
        assert!(!client.edit(&NoteId::from("missing"), "x", "y"));
        assert!(!client.delete(&NoteId::from("missing")));
        client.flush().await;
        assert_eq!(store.write_count(), writes);

        assert!(client.edit(&id, "A", "changed"));
        client.flush().await;
        assert_eq!(store.write_count(), writes + 1);
    }

    #[tokio::test]
    async fn delete_preserves_order_of_the_rest() {
        let (client, _store) = signed_in("u1").await;
        let a = client.add("", "a").unwrap();
        let b = client.add("", "b").unwrap();
        let c = client.add("", "c").unwrap();
        assert!(client.delete(&b));
        let ids: Vec<NoteId> = client.notes().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[tokio::test]
    async fn synchronize_then_load_round_trips() {
        let (client, store) = signed_in("u1").await;
        client.add("Groceries", "Milk");
        client.add("", "Call mom");
        let expected = client.notes();
        let outcome = client.synchronize().outcome().await;
        assert_eq!(
            outcome,
            SyncOutcome::Written {
                user_id: "u1".to_string(),
                notes: 2
            }
        );

        let other = NotesClient::new(Arc::new(store));
        assert_eq!(other.load("u1").await, expected);
    }

    #[tokio::test]
    async fn unreadable_cache_starts_empty() {
        let mut cache = MemoryCache::new();
        cache.set(NOTES_CACHE_KEY, "not json").unwrap();
        let store = MemoryDocumentStore::new();
        store.insert(
            "u1",
            NotesDocument::new(vec![Note::with_id("a", "A", "remote")]),
        );
        let client = NotesClient::new_with_options(
            NotesClientOptions::builder()
                .store(Arc::new(store))
                .cache(cache)
                .build(),
        );
        assert!(client.is_empty());

        assert_eq!(
            client.load("u1").await,
            vec![Note::with_id("a", "A", "remote")]
        );
        assert_eq!(client.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn failed_load_keeps_the_collection() {
        let store = MemoryDocumentStore::new();
        let mut cache = MemoryCache::new();
        let seed = vec![Note::with_id("s", "Seed", "from cache")];
        write_notes(&mut cache, NOTES_CACHE_KEY, &seed).unwrap();
        let client = NotesClient::new_with_options(
            NotesClientOptions::builder()
                .store(Arc::new(store.clone()))
                .cache(cache)
                .build(),
        );
        assert_eq!(client.notes(), seed);

        store.set_fail_reads(true);
        assert_eq!(client.load("u1").await, seed);
        assert!(matches!(
            client.try_load("u1").await,
            Err(NotesClientError::Store(StoreError::Read { .. }))
        ));
        assert_eq!(client.notes(), seed);
        assert_eq!(client.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn failed_write_does_not_roll_back() {
        let (client, store) = signed_in("u1").await;
        store.set_fail_writes(true);
        let id = client.add("A", "kept").unwrap();
        let outcome = client.synchronize().outcome().await;
        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert_eq!(client.get(&id).map(|n| n.text).as_deref(), Some("kept"));
        assert_eq!(store.document("u1"), Some(NotesDocument::default()));
    }

    #[tokio::test]
    async fn mutations_without_a_session_are_not_written() {
        let (client, store) = client_with_store();
        assert!(client.add("A", "local only").is_some());
        assert_eq!(client.synchronize().outcome().await, SyncOutcome::Skipped);
        assert_eq!(client.len(), 1);
        assert_eq!(store.write_count(), 0);
        assert!(matches!(
            client.try_load("").await,
            Err(NotesClientError::Auth(AuthError::NotAuthenticated))
        ));
    }

    #[tokio::test]
    async fn mirrors_collection_to_cache_when_enabled() {
        let store = MemoryDocumentStore::new();
        let cache = MemoryCache::new();
        let provider = MemoryIdentityProvider::new();
        let client = NotesClient::new_with_options(
            NotesClientOptions::builder()
                .store(Arc::new(store))
                .cache(cache.clone())
                .cache_key("my-notes")
                .mirror_to_cache(true)
                .build(),
        );
        client.attach(&provider);
        provider.sign_in(AuthUser::new("u1", "Ada"));
        client.flush().await;

        client.add("A", "cached");
        let cached = read_notes(&mut cache.clone(), "my-notes").unwrap().unwrap();
        assert_eq!(cached, client.notes());

        client.sign_out(&provider).await;
        assert_eq!(cache.value("my-notes"), None);
    }

    #[tokio::test]
    async fn auth_lifecycle_follows_the_provider() {
        let (client, store) = client_with_store();
        store.insert(
            "u1",
            NotesDocument::new(vec![Note::with_id("a", "A", "remote")]),
        );
        let provider = MemoryIdentityProvider::new();
        client.attach(&provider);
        assert_eq!(client.state(), SessionState::Unauthenticated);

        provider.sign_in(AuthUser::new("u1", "Ada"));
        assert!(client.state().is_authenticated());
        client.flush().await;
        assert_eq!(client.state(), SessionState::Ready);
        assert_eq!(client.display_name().as_deref(), Some("Ada"));
        assert_eq!(client.notes(), vec![Note::with_id("a", "A", "remote")]);

        client.sign_out(&provider).await;
        assert_eq!(client.state(), SessionState::Unauthenticated);
        assert_eq!(client.user_id(), None);
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn failed_sign_out_keeps_the_session() {
        let (client, _store) = client_with_store();
        let provider = MemoryIdentityProvider::new();
        client.attach(&provider);
        provider.sign_in(AuthUser::new("u1", "Ada"));
        client.flush().await;
        client.add("", "still here");

        provider.set_fail_sign_out(true);
        client.sign_out(&provider).await;
        assert_eq!(client.user_id().as_deref(), Some("u1"));
        assert_eq!(client.len(), 1);
    }

    #[tokio::test]
    async fn switching_users_clears_the_previous_notes() {
        let (client, store) = signed_in("u1").await;
        client.add("", "private to u1");
        client.flush().await;

        assert_eq!(client.load("u2").await, vec![]);
        assert_eq!(client.user_id().as_deref(), Some("u2"));
        assert_eq!(store.document("u2"), Some(NotesDocument::default()));
        assert_eq!(store.document("u1").unwrap().notes.len(), 1);
    }

    async fn load_across_sign_out(guard_stale_responses: bool) -> NotesClient {
        let inner = MemoryDocumentStore::new();
        inner.insert(
            "u1",
            NotesDocument::new(vec![Note::with_id("a", "A", "late")]),
        );
        let (release, gate) = oneshot::channel();
        let store = GatedStore {
            inner,
            gate: Mutex::new(Some(gate)),
        };
        let client = NotesClient::new_with_options(
            NotesClientOptions::builder()
                .store(Arc::new(store))
                .guard_stale_responses(guard_stale_responses)
                .build(),
        );

        {
            let load = client.load("u1");
            futures::pin_mut!(load);
            assert!(futures::poll!(&mut load).is_pending());

            client.handle_auth_changed(None);
            release.send(()).unwrap();
            load.await;
        }
        client
    }

    #[tokio::test]
    async fn stale_load_is_dropped_after_sign_out() {
        let client = load_across_sign_out(true).await;
        assert!(client.is_empty());
        assert_eq!(client.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn stale_load_applies_when_unguarded() {
        let client = load_across_sign_out(false).await;
        assert_eq!(client.len(), 1);
        assert_eq!(client.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn change_callbacks_see_each_mutation() {
        let (client, _store) = signed_in("u1").await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        client.on_notes_changed(move |notes: &[Note]| {
            seen_clone.lock().push(notes.len());
        });

        let id = client.add("", "one").unwrap();
        client.add("", "");
        client.edit(&id, "", "one, edited");
        client.delete(&id);
        assert_eq!(*seen.lock(), vec![1, 1, 0]);
    }
}

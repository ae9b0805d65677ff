//! Notes client options and configuration types.

use crate::{cache::NoteCache, store::DocumentStore};
use std::{fmt, sync::Arc};

/// Options for [`NotesClient::new_with_options`](crate::NotesClient::new_with_options).
#[derive(bon::Builder)]
pub struct NotesClientOptions {
    /// The remote document store holding one document per user.
    pub store: Arc<dyn DocumentStore>,

    /// Local cache read once at startup to seed the collection before the store answers.
    #[builder(into)]
    pub cache: Option<Box<dyn NoteCache>>,

    /// Key of the cached note sequence. If not provided, `"notes"` will be used.
    #[builder(into)]
    pub cache_key: Option<String>,

    /// If set to `true`, every change to the collection is also written to the cache,
    /// and signing out removes the cached entry. Defaults to `false`.
    pub mirror_to_cache: Option<bool>,

    /// If set to `true`, `edit` and `delete` skip the remote write when they change nothing.
    /// Defaults to `false`, which writes after every call.
    pub skip_unchanged_sync: Option<bool>,

    /// If set to `true`, a load that completes after the session changed is dropped instead
    /// of overwriting the collection. Defaults to `true`.
    pub guard_stale_responses: Option<bool>,
}

impl fmt::Debug for NotesClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesClientOptions")
            .field("cache", &self.cache.is_some())
            .field("cache_key", &self.cache_key)
            .field("mirror_to_cache", &self.mirror_to_cache)
            .field("skip_unchanged_sync", &self.skip_unchanged_sync)
            .field("guard_stale_responses", &self.guard_stale_responses)
            .finish()
    }
}

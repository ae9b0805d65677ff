use super::{CacheError, NoteCache};
#[cfg(feature = "tracing")]
use tracing::error;
use web_sys::Storage;

/// [`NoteCache`] backed by the browser's `localStorage`.
///
/// Keys are stored unprefixed so a page that already keeps its notes under `"notes"`
/// seeds the client directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageCache;

impl LocalStorageCache {
    pub fn new() -> Self {
        LocalStorageCache
    }

    fn get_local_storage(&self) -> Result<Storage, CacheError> {
        match gloo_utils::window().local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(CacheError::Unavailable(
                "LocalStorage not available".to_string(),
            )),
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!("Could not find local storage: {e:?}");
                Err(CacheError::Unavailable(format!("{e:?}")))
            }
        }
    }
}

impl NoteCache for LocalStorageCache {
    fn get(&mut self, key: &str) -> Result<Option<String>, CacheError> {
        let local_storage = self.get_local_storage()?;
        local_storage
            .get_item(key)
            .map_err(|e| CacheError::Unavailable(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        let local_storage = self.get_local_storage()?;
        local_storage
            .set_item(key, value)
            .map_err(|e| CacheError::Unavailable(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        let local_storage = self.get_local_storage()?;
        local_storage
            .remove_item(key)
            .map_err(|e| CacheError::Unavailable(format!("{e:?}")))
    }
}

impl From<LocalStorageCache> for Box<dyn NoteCache> {
    fn from(cache: LocalStorageCache) -> Self {
        Box::new(cache)
    }
}

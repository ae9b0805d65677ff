//! File-based cache for native environments.

use super::{CacheError, NoteCache};
use crate::util::file_key::file_name;
use std::{fs, io::ErrorKind, path::PathBuf};

const FILE_CACHE_PREFIX: &str = "cache-";
const CACHE_FILE_EXTENSION: &str = "json";

/// [`NoteCache`] that persists each key as a file inside a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    directory: PathBuf,
}

impl FileCache {
    /// Creates a new instance of [`FileCache`].
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory where the cache files will be stored.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn ensure_directory(&self) -> Result<(), CacheError> {
        if self.directory.as_os_str().is_empty() {
            return Ok(()); // current directory
        }
        fs::create_dir_all(&self.directory)?;
        Ok(())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(file_name(FILE_CACHE_PREFIX, key, CACHE_FILE_EXTENSION))
    }
}

impl NoteCache for FileCache {
    fn get(&mut self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.file_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::from(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.ensure_directory()?;
        fs::write(self.file_path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.file_path(key)) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::from(e)),
        }
    }
}

impl From<FileCache> for Box<dyn NoteCache> {
    fn from(cache: FileCache) -> Self {
        Box::new(cache)
    }
}

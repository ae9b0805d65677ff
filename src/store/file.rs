//! File-based document store for native environments.
//!
//! Each user's document is persisted as a JSON file inside a directory, which lets the
//! client run against a local folder (or a synced network share) instead of a hosted store.

use super::{DocumentStore, StoreError, StoreFuture};
use crate::{api::NotesDocument, util::file_key::file_name};
use std::{io::ErrorKind, path::PathBuf};
use tokio::fs;
use uuid::Uuid;

const FILE_STORE_PREFIX: &str = "notes-";
const STORAGE_FILE_EXTENSION: &str = "json";

/// [`DocumentStore`] that keeps one JSON file per user.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    directory: PathBuf,
}

impl FileDocumentStore {
    /// Creates a new instance of [`FileDocumentStore`].
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory holding the documents. Created on first write.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn file_path(&self, user_id: &str) -> PathBuf {
        self.directory.join(file_name(
            FILE_STORE_PREFIX,
            user_id,
            STORAGE_FILE_EXTENSION,
        ))
    }

    async fn ensure_directory(&self) -> Result<(), StoreError> {
        if self.directory.as_os_str().is_empty() {
            return Ok(()); // current directory
        }
        fs::create_dir_all(&self.directory).await?;
        Ok(())
    }

    async fn read_document(&self, user_id: &str) -> Result<Option<NotesDocument>, StoreError> {
        match fs::read_to_string(self.file_path(user_id)).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn write_document(
        &self,
        user_id: &str,
        document: &NotesDocument,
    ) -> Result<(), StoreError> {
        self.ensure_directory().await?;
        let serialized = serde_json::to_string(document)?;
        let path = self.file_path(user_id);
        // Concurrent writers each rename their own file, so the last rename wins whole.
        let temp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp, serialized).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::Write {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}

impl DocumentStore for FileDocumentStore {
    fn get<'a>(
        &'a self,
        user_id: &'a str,
    ) -> StoreFuture<'a, Result<Option<NotesDocument>, StoreError>> {
        Box::pin(self.read_document(user_id))
    }

    fn set<'a>(
        &'a self,
        user_id: &'a str,
        document: NotesDocument,
    ) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { self.write_document(user_id, &document).await })
    }
}

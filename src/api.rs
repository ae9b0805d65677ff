use crate::note::Note;
use serde::{Deserialize, Serialize};

/// The per-user document held by a [`DocumentStore`](crate::store::DocumentStore).
///
/// Serialized as `{ "notes": [{ "id": ..., "title": ..., "text": ... }, ...] }`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesDocument {
    /// The full note collection, in display order.
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl NotesDocument {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }
}

impl From<Vec<Note>> for NotesDocument {
    fn from(notes: Vec<Note>) -> Self {
        Self { notes }
    }
}

/// Represents a user reported by an [`IdentityProvider`](crate::identity::IdentityProvider).
///
/// The `uid` is stable across sessions and keys the user's document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// The stable user identifier.
    pub uid: String,
    /// The name shown to the user while signed in.
    #[serde(default)]
    pub display_name: String,
}

impl AuthUser {
    pub fn new<U: Into<String>, N: Into<String>>(uid: U, display_name: N) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
        }
    }
}

//! The note entity held by a [`NoteCollection`](crate::collection::NoteCollection).

use serde::{Deserialize, Serialize};

mod id;

pub use id::NoteId;

/// A user-authored title/text pair with a unique identifier.
///
/// The `id` is fixed at creation; only `title` and `text` change afterwards.
#[derive(Serialize, Deserialize, Debug, Hash, PartialEq, Eq, Clone)]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl Note {
    /// Creates a note with a freshly generated id.
    ///
    /// Returns `None` when `text` is empty or whitespace only. The text itself is stored verbatim.
    pub fn new<T, S>(title: T, text: S) -> Option<Self>
    where
        T: Into<String>,
        S: Into<String>,
    {
        let text = text.into();
        if is_blank(&text) {
            return None;
        }
        Some(Self {
            id: NoteId::generate(),
            title: title.into(),
            text,
        })
    }

    /// Builds a note with a known id, e.g. when restoring from a document.
    pub fn with_id<I, T, S>(id: I, title: T, text: S) -> Self
    where
        I: Into<NoteId>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }

    /// Replaces title and text, returning whether anything changed.
    pub(crate) fn update(&mut self, title: String, text: String) -> bool {
        let changed = self.title != title || self.text != text;
        self.title = title;
        self.text = text;
        changed
    }
}

/// Whether `text` would be rejected when creating a note.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

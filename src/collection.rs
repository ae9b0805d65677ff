//! Ordered in-memory collection of a user's notes.

use crate::note::{Note, NoteId};
use std::collections::HashSet;
#[cfg(feature = "tracing")]
use tracing::warn;

/// Ordered sequence of [`Note`]s in display order.
///
/// Ids are unique within the collection. All mutations happen in place and report whether
/// the contents changed so the caller can decide what to synchronize.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NoteCollection {
    notes: Vec<Note>,
}

/// Result of a mutation on a [`NoteCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A note was appended.
    Added(NoteId),
    /// The note's title or text was replaced.
    Edited { id: NoteId, changed: bool },
    /// The note was removed.
    Deleted(Note),
    /// Nothing matched (blank text on add, unknown id on edit or delete).
    Ignored,
}

impl Mutation {
    /// Whether the collection contents differ after the mutation.
    pub fn changed(&self) -> bool {
        match self {
            Mutation::Added(_) | Mutation::Deleted(_) => true,
            Mutation::Edited { changed, .. } => *changed,
            Mutation::Ignored => false,
        }
    }
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from a sequence, dropping later duplicates of an id.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut seen = HashSet::with_capacity(notes.len());
        let notes = notes
            .into_iter()
            .filter(|note| {
                let first = seen.insert(note.id.clone());
                if !first {
                    #[cfg(feature = "tracing")]
                    warn!("Dropping note {} with a duplicate id ({:?})", note.id, note.text);
                }
                first
            })
            .collect();
        Self { notes }
    }

    /// Appends a note with a fresh id unless `text` is blank.
    pub fn add(&mut self, title: impl Into<String>, text: impl Into<String>) -> Mutation {
        let Some(mut note) = Note::new(title, text) else {
            return Mutation::Ignored;
        };
        while self.contains(&note.id) {
            note.id = NoteId::generate();
        }
        let id = note.id.clone();
        self.notes.push(note);
        Mutation::Added(id)
    }

    /// Replaces title and text of the note with `id`, keeping its position.
    pub fn edit(&mut self, id: &NoteId, title: impl Into<String>, text: impl Into<String>) -> Mutation {
        match self.notes.iter_mut().find(|note| &note.id == id) {
            Some(note) => {
                let changed = note.update(title.into(), text.into());
                Mutation::Edited {
                    id: id.clone(),
                    changed,
                }
            }
            None => Mutation::Ignored,
        }
    }

    /// Removes the note with `id`, preserving the order of the rest.
    pub fn delete(&mut self, id: &NoteId) -> Mutation {
        match self.notes.iter().position(|note| &note.id == id) {
            Some(index) => Mutation::Deleted(self.notes.remove(index)),
            None => Mutation::Ignored,
        }
    }

    /// Replaces the whole collection.
    pub fn replace(&mut self, notes: Vec<Note>) {
        *self = Self::from_notes(notes);
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    pub fn to_vec(&self) -> Vec<Note> {
        self.notes.clone()
    }
}

impl From<Vec<Note>> for NoteCollection {
    fn from(notes: Vec<Note>) -> Self {
        Self::from_notes(notes)
    }
}

impl<'a> IntoIterator for &'a NoteCollection {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}
